use crate::{
  shape::Shape,
  tensor::Tensor,
  scalar::{ Inner, Numeric, Signed, Real },
  ops::{ BaseOps, NumericOps, SignedOps, RealOps },
};


#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Element-wise kernel shared by all unary compute operations.
///
/// Large contiguous tensors get split across threads when the
/// `rayon` feature is enabled.

fn map<T, O, F>(tensor: &Tensor<T>, cb: F) -> Tensor<O>
where
  T: Inner,
  O: Inner,
  F: Fn(T) -> O + Send + Sync,
{
  #[cfg(feature = "rayon")]
  {
    use rayon::prelude::*;
    if tensor.size() >= PARALLEL_THRESHOLD && tensor.shape.contiguous() {
      let raw = tensor.raw();
      let start = tensor.shape.offset;
      let data = raw[start..start + tensor.size()]
        .par_iter()
        .map(|&a| cb(a) )
        .collect();
      return Tensor::new(&tensor.shape.dims, data)
    }
  }
  tensor.vectorize(cb)
}


impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn scalar(item: T) -> Self {
    Self::new(&[], vec![item])
  }

  fn shape(&self) -> &Shape {
    &self.shape
  }
}

impl<T: Numeric> NumericOps<T> for Tensor<T> {
  fn sum(&self) -> Self {
    Self::scalar(self.param_iter().sum())
  }

  fn sqr(&self) -> Self {
    map(self, |a| a * a )
  }
}

impl<T: Signed> SignedOps<T> for Tensor<T> {
  fn abs(&self) -> Self {
    map(self, |a| a.abs() )
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn pow(&self, rhs: &Self) -> Self {
    self.zip(rhs, |(a, b)| a.powf(b) )
  }

  fn exp(&self) -> Self {
    map(self, |a| a.exp() )
  }

  fn log(&self) -> Self {
    map(self, |a| a.ln() )
  }

  fn sin(&self) -> Self {
    map(self, |a| a.sin() )
  }

  fn cos(&self) -> Self {
    map(self, |a| a.cos() )
  }

  fn relu(&self) -> Self {
    map(self, |a| if a > T::zero() { a } else { T::zero() })
  }

  fn sigmoid(&self) -> Self {
    map(self, |a| T::one() / (T::one() + (-a).exp()) )
  }
}

impl<T: Signed> std::ops::Neg for &Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    map(self, |a| -a )
  }
}

impl<T: Signed> std::ops::Neg for Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($trait:ident, $meth:ident, $symbol:tt) => {
    impl<T: Numeric> std::ops::$trait for &Tensor<T> { // &tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        self.zip(rhs, |(a, b)| a $symbol b )
      }
    }

    impl<T: Numeric> std::ops::$trait for Tensor<T> { // tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<Tensor<T>> for &Tensor<T> { // &tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Tensor<T>) -> Tensor<T> {
        self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<&Tensor<T>> for Tensor<T> { // tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: &Tensor<T>) -> Tensor<T> {
        &self $symbol rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for &Tensor<T> { // &tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        map(self, move |a| a $symbol rhs )
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for Tensor<T> { // tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        &self $symbol rhs
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);
add_operator!(Rem, rem, %);
