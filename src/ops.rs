use num_traits::NumOps;

use crate::Shape;
use crate::scalar::{ Inner, Numeric, Signed, Real };
use crate::variable::Variable;


/// Mid-level operations that are also implemented
/// for non-numeric [Inner] types.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> &Shape;
}


/// Mid-level operations for [Numeric] inner types.

pub trait NumericOps<I: Numeric>: NumOps + NumOps<I, Self> + Sized {
  /// Sum over all elements, producing a scalar.
  fn sum(&self) -> Self;
  /// Element-wise square.
  fn sqr(&self) -> Self;
}


/// Mid-level operations for [Signed] inner types.

pub trait SignedOps<I: Signed>: std::ops::Neg {
  fn abs(&self) -> Self;
}


/// Mid-level operations for [Real] inner types.
///
/// When called on a [Variable], every one of these gets
/// recorded in the computation graph.

pub trait RealOps<I: Real> {
  fn pow(&self, rhs: &Self) -> Self;
  fn exp(&self) -> Self;
  fn log(&self) -> Self;
  fn sin(&self) -> Self;
  fn cos(&self) -> Self;
  fn relu(&self) -> Self;
  fn sigmoid(&self) -> Self;
}


/// High-level operations, implemented exclusively on top of
/// the mid-level traits. Any of these used inside a compiled
/// function gets traced as its constituent operations.

pub trait Hops<I>: BaseOps<I> + NumericOps<I> + SignedOps<I> + RealOps<I>
where
  I: Real,
  for<'a> &'a Self: NumOps<&'a Self, Self> + NumOps<I, Self>,
{
  fn powf(&self, exp: I) -> Self {
    self.pow(&Self::scalar(exp))
  }

  fn sqrt(&self) -> Self {
    self.powf(I::from(0.5).unwrap())
  }

  fn mean(&self) -> Self {
    let n = I::from(self.shape().size()).unwrap();
    self.sum() / n
  }

  fn norm(&self) -> Self {
    self.sqr().sum().sqrt()
  }

  fn softplus(&self) -> Self {
    (self.exp() + I::one()).log()
  }
}


/// Element-wise square of a tracked input.
///
/// This is the built-in operation handed to [compile](crate::compile).

pub fn square<T: Real>(input: &Variable<T>) -> Variable<T> {
  input.sqr()
}


#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::Tensor;

  #[test]
  fn mean() {
    let a = Tensor::new(&[3,2], vec![1., 2., 3., 4., 5., 6.]);
    assert_eq!(a.mean(), Tensor::scalar(3.5));
  }

  #[test]
  fn norm() {
    let a = Tensor::vec(&[3.0, 4.0]);
    assert_abs_diff_eq!(a.norm().item(), 5.0, epsilon = 1e-6);
  }

  #[test]
  fn square_traced() {
    let x = Tensor::vec(&[1.0, 2.0, 3.0]).tracked();
    let y = square(&x);
    assert_eq!(y.tensor(), &Tensor::vec(&[1.0, 4.0, 9.0]));
  }

  #[test]
  fn softplus() {
    let a = Tensor::vec(&[0.0f64]).tracked().softplus();
    assert_abs_diff_eq!(a.item(), 2f64.ln(), epsilon = 1e-12);
  }
}
