use serde::{ Serialize, Deserialize };

use crate::{
  shape::Shape,
  tensor::Tensor,
  variable::{ Variable, BinaryOp, UnaryOp },
  scalar::Real,
  ops::{ BaseOps, NumericOps, SignedOps, RealOps },
};


impl<T: Real> BaseOps<T> for Variable<T> {
  fn scalar(item: T) -> Self {
    Self::from_tensor(Tensor::scalar(item))
  }

  fn shape(&self) -> &Shape {
    self.node.data.shape()
  }
}

impl<T: Real> NumericOps<T> for Variable<T> {
  fn sum(&self) -> Self {
    self.unary_op(Sum)
  }

  fn sqr(&self) -> Self {
    self.unary_op(Square)
  }
}

impl<T: Real> SignedOps<T> for Variable<T> {
  fn abs(&self) -> Self {
    self.unary_op(Abs)
  }
}

impl<T: Real> RealOps<T> for Variable<T> {
  fn pow(&self, rhs: &Self) -> Self {
    self.binary_op(Pow, rhs)
  }

  fn exp(&self) -> Self {
    self.unary_op(Exp)
  }

  fn log(&self) -> Self {
    self.unary_op(Log)
  }

  fn sin(&self) -> Self {
    self.unary_op(Sin)
  }

  fn cos(&self) -> Self {
    self.unary_op(Cos)
  }

  fn relu(&self) -> Self {
    self.unary_op(ReLU)
  }

  fn sigmoid(&self) -> Self {
    self.unary_op(Sigmoid)
  }
}

impl<T: Real> std::ops::Neg for &Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    self.unary_op(Neg)
  }
}

impl<T: Real> std::ops::Neg for Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$op for &Variable<T> { // &tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        self.binary_op($op, rhs)
      }
    }

    impl<T: Real> std::ops::$op for Variable<T> { // tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<Variable<T>> for &Variable<T> { // &tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Variable<T>) -> Variable<T> {
        self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<&Variable<T>> for Variable<T> { // tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: &Variable<T>) -> Variable<T> {
        &self $symbol rhs
      }
    }

    impl<T: Real> std::ops::$op<T> for &Variable<T> { // &tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        self $symbol &Variable::scalar(rhs)
      }
    }

    impl<T: Real> std::ops::$op<T> for Variable<T> { // tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        &self $symbol &Variable::scalar(rhs)
      }
    }

    impl std::ops::$op<&Variable<f32>> for f32 { // T * &tensor
      type Output = Variable<f32>;

      fn $meth(self, rhs: &Variable<f32>) -> Variable<f32> {
        &Variable::scalar(self) $symbol rhs
      }
    }

    impl std::ops::$op<Variable<f32>> for f32 { // T * tensor
      type Output = Variable<f32>;

      fn $meth(self, rhs: Variable<f32>) -> Variable<f32> {
        &Variable::scalar(self) $symbol &rhs
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);
add_operator!(Rem, rem, %);


// Registers op structs as variants of a serializable enum, so that
// recorded graphs can be stored and replayed without the original code.

macro_rules! register_ops {
  ($enum:ident, $trait:ident, $getter:ident, [ $($op:ident),* ]) => {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum $enum {
      $($op($op)),*
    }

    impl $enum {
      pub fn $getter<T: Real>(&self) -> &dyn $trait<T> {
        match self {
          $(Self::$op(op) => op),*
        }
      }
    }

    $(
      impl From<$op> for $enum {
        fn from(op: $op) -> Self {
          Self::$op(op)
        }
      }
    )*
  };
}

register_ops!(UnaryMops, UnaryOp, as_unary_op, [Square, Neg, Abs, Exp, Log, Sin, Cos, ReLU, Sigmoid, Sum]);
register_ops!(BinaryMops, BinaryOp, as_binary_op, [Add, Sub, Mul, Div, Rem, Pow]);


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Add;

impl<T: Real> BinaryOp<T> for Add {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs + rhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sub;

impl<T: Real> BinaryOp<T> for Sub {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs - rhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mul;

impl<T: Real> BinaryOp<T> for Mul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs * rhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Div;

impl<T: Real> BinaryOp<T> for Div {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs / rhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rem;

impl<T: Real> BinaryOp<T> for Rem {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs % rhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pow;

impl<T: Real> BinaryOp<T> for Pow {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.pow(rhs)
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Square;

impl<T: Real> UnaryOp<T> for Square {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sqr()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neg;

impl<T: Real> UnaryOp<T> for Neg {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    -lhs
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abs;

impl<T: Real> UnaryOp<T> for Abs {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.abs()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exp;

impl<T: Real> UnaryOp<T> for Exp {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.exp()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log;

impl<T: Real> UnaryOp<T> for Log {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.log()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sin;

impl<T: Real> UnaryOp<T> for Sin {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sin()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cos;

impl<T: Real> UnaryOp<T> for Cos {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.cos()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReLU;

impl<T: Real> UnaryOp<T> for ReLU {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.relu()
  }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sigmoid;

impl<T: Real> UnaryOp<T> for Sigmoid {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sigmoid()
  }
}


/// Sum over all elements.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sum;

impl<T: Real> UnaryOp<T> for Sum {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sum()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::Hops;

  #[test]
  fn scalar_lhs() {
    let x = Tensor::vec(&[1.0f32, 2.0]).tracked();
    let y = 1.0f32 - &x * 2.0;
    assert_eq!(y.tensor(), &Tensor::vec(&[-1.0, -3.0]));
  }

  #[test]
  fn recorded_ops() {
    let x = Tensor::vec(&[4.0]).tracked();
    let y = x.sqrt();
    // Constant exponent & pow node
    assert_eq!(y.history().len(), 3);
    assert_eq!(y.item(), 2.0);
  }

  #[test]
  fn enum_dispatch() {
    let op: UnaryMops = Square.into();
    let x = Tensor::vec(&[3.0]);
    assert_eq!(op.as_unary_op().run(&x), Tensor::vec(&[9.0]));
  }
}
