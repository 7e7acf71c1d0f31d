//! Trace-and-replay compilation for tensor operations.
//! Tiny. Few dependencies. CPU only.
//!
//! # Features
//!
//! - **Compiled functions** — [compile] turns any function over tracked
//! tensors into a [Compiled] callable. The first call for a new input
//! signature traces the function into a computation graph, later calls
//! feed new data into that graph and replay it.
//!
//! - **Same results as eager** — Compiled functions run the very same
//! kernels as their eager counterparts, so compiling never changes
//! numerical results.
//!
//! - **Broadcasting** — Tensors with differing but compatible shapes get
//! broadcasted to matching dimensions automatically.
//!
//! - **Zero-copy views** — Broadcasted tensors share storage with the
//! tensor they were created from.
//!
//! - **Graph recycling** — Traced graphs can be serialized and loaded
//! elsewhere, without access to the original code.
//!
//! # Examples
//!
//! Compiling the built-in square operation:
//! ```
//! use microjit::{ compile, ops::square, Tensor };
//!
//! let compiled_square = compile(square);
//!
//! let input = Tensor::vec(&[1.0, 2.0, 3.0]);
//! let result = compiled_square.call(&input).unwrap();
//!
//! assert_eq!(result, Tensor::vec(&[1.0, 4.0, 9.0]));
//! ```
//!
//! Compiling a custom function:
//! ```
//! use microjit::{ ops::*, compile, Tensor, Variable };
//!
//! let softplus = compile(|x: &Variable<f32>| (x.exp() + 1.0).log());
//! let y = softplus.call(&Tensor::vec(&[0.0])).unwrap();
//! assert!((y.item() - 2f32.ln()).abs() < 1e-6);
//! ```
//!
//! # Optional features
//!
//! - `rayon` — Split large element-wise kernels across threads.

mod internal;
mod error;
mod shape;
mod tensor;
mod variable;
mod compile;

pub mod ops;
pub mod scalar;

pub use error::{ Error, Result };
pub use shape::Shape;
pub use tensor::Tensor;
pub use variable::{ Variable, Graph, UnaryOp, BinaryOp, UnaryMops, BinaryMops };
pub use compile::{ compile, compile_with, compile_multi, Compiled, CompileOptions, Mode };
