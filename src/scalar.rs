use rand::distributions::uniform::SampleUniform;
use num_traits::{ NumAssignOps, Num, NumCast };


/// Element types that may be stored in a [Tensor](crate::Tensor).
///
/// Implemented automatically for every type satisfying its
/// dependent traits.

pub trait Inner: PartialEq + Clone + Copy + Send + Sync + std::fmt::Debug {}
impl<T: PartialEq + Clone + Copy + Send + Sync + std::fmt::Debug> Inner for T {}


/// Element types supporting arithmetic.

pub trait Numeric: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum {}
impl<T: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum> Numeric for T {}


/// Numeric element types that can be negated.

pub trait Signed: Numeric + num_traits::Signed {}
impl<T: Numeric + num_traits::Signed> Signed for T {}


/// Continuous element types.
///
/// Only tensors of these types can be tracked and compiled.

pub trait Real: Signed + num_traits::real::Real + SampleUniform {}
impl<T: Signed + num_traits::real::Real + SampleUniform> Real for T {}
