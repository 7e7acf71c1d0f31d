use std::rc::Rc;
use std::cell::{ Ref, RefCell };

use rand::Rng;
use serde::{ Serialize, Deserialize };

mod kernels;

use crate::{
  internal::*,
  shape::Shape,
  variable::Variable,
  scalar::{ Inner, Numeric, Real },
  ops::Hops,
};


/// Multidimensional array.
///
/// Tensors may contain any type that satisfies [Inner], but
/// arithmetic is only available for [Numeric] inner types.
///
/// [Real] tensors can be wrapped in a [Variable] by calling
/// [tracked](Tensor::tracked), which records all further
/// operations into a computation graph.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<RefCell<Vec<T>>>,
}

impl<T: Real> Hops<T> for Tensor<T> {}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    if self.shape.dims != rhs.shape.dims { return false }
    self.param_iter().zip(rhs.param_iter()).all(|(a, b)| a == b )
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data: Rc::new(RefCell::new(data)) }
  }

  pub fn new(shape: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(shape), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn from_vec(vec: Vec<T>) -> Self {
    Self::new(&[vec.len()], vec)
  }

  pub fn fill(shape: &[usize], filler: T) -> Self {
    Self::new(shape, vec![filler; shape.iter().product()])
  }

  pub fn raw(&self) -> Ref<Vec<T>> {
    self.data.borrow()
  }

  /// Copy of all elements in row-major order.

  pub fn to_vec(&self) -> Vec<T> {
    self.param_iter().collect()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  pub fn item(&self) -> T {
    assert!(self.size() == 1,
      "Can't extract item from non-scalar {}", self.shape);
    self.raw()[self.shape.offset]
  }

  /// Overwrite this tensor's elements in place.
  ///
  /// Every other tensor sharing the same storage sees the change.

  pub fn assign(&self, other: &Self) {
    assert!(self.shape.dims == other.shape.dims,
      "Could not assign {} tensor to {} tensor", other.shape, self.shape);
    // Avoid clashing borrow when tensors share storage
    let other = if Rc::ptr_eq(&self.data, &other.data) {
      other.detach()
    } else {
      other.clone()
    };
    let mut data = self.data.borrow_mut();
    let other_data = other.data.borrow();
    for (i, j) in self.shape.iter().zip(other.shape.iter()) {
      data[i] = other_data[j];
    }
  }

  /// View of this tensor stretched to the common shape with `shape`.

  pub fn broadcast(&self, shape: &Shape) -> Self {
    Self {
      shape: self.shape.broadcast(shape),
      data: self.data.clone(),
    }
  }

  pub fn contiguous(&self) -> Self {
    if self.shape.contiguous() {
      self.clone()
    } else {
      self.detach()
    }
  }

  /// Copy into fresh, contiguous storage.

  pub fn detach(&self) -> Self {
    self.vectorize(|a| a )
  }

  pub fn zip<O,F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn((T, T)) -> O,
  {
    let lhs = self.broadcast(&rhs.shape);
    let rhs = rhs.broadcast(&lhs.shape);
    let data: Vec<O> = lhs.param_iter()
      .zip(rhs.param_iter())
      .map(cb)
      .collect();
    Tensor::new(&lhs.shape.dims, data)
  }

  pub fn vectorize<O,F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.param_iter().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  pub fn param_iter(&self) -> TensorIterator<T> {
    TensorIterator::new(self)
  }
}

impl<T: Numeric> Tensor<T> {
  pub fn ones(shape: &[usize]) -> Self {
    Self::fill(shape, T::one())
  }

  pub fn zeros(shape: &[usize]) -> Self {
    Self::fill(shape, T::zero())
  }

  pub fn arrange(shape: &[usize], start: T, step: T) -> Self {
    Self::new(shape, (0..shape.iter().product())
      .map(|i| T::from(i).unwrap() * step + start )
      .collect())
  }
}

impl<T: Real> Tensor<T> {
  pub fn rand(shape: &[usize]) -> Self {
    let mut rng = rand::thread_rng();
    let data = (0..shape.iter().product())
      .map(|_| rng.gen_range(T::zero(), T::one()) )
      .collect();
    Self::new(shape, data)
  }

  pub fn randn(shape: &[usize]) -> Self {
    let len = shape.iter().product();
    let mut data = vec![T::zero(); len];
    for i in 0..(len + 1) / 2 {
      let j = i * 2;
      let (r1, r2): (T, T) = randn();
      data[j] = r1;
      data[(j + 1) % len] = r2;
    }
    Self::new(shape, data)
  }

  /// Evenly spaced values from `start` to `end`, both included.
  /// A single element holds `start`.

  pub fn linspace(shape: &[usize], start: T, end: T) -> Self {
    let size = shape.iter().product::<usize>();
    if size <= 1 {
      return Self::fill(shape, start)
    }
    let steps = T::from(size - 1).unwrap();
    Self::arrange(shape, start, (end - start) / steps)
  }

  /// Start recording operations on a copy of this tensor.

  pub fn tracked(&self) -> Variable<T> {
    Variable::from_tensor(self.detach())
  }

  pub fn all_close(&self, rhs: &Self, tolerance: T) -> bool {
    self.shape.dims == rhs.shape.dims &&
    self.param_iter()
      .zip(rhs.param_iter())
      .all(|(a, b)| if a > b { a - b <= tolerance } else { b - a <= tolerance })
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape.dims, &self.to_vec(), f)
  }
}

fn print_chunks<T: std::fmt::Debug>(depth: usize, dims: &[usize], vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  if dims.is_empty() {
    write!(f, "{:?}", vec[0])
  } else if depth == dims.len() - 1 {
    write!(f, "{:?}", vec)
  } else {
    let indent = " ".repeat((depth + 1) * 2);
    write!(f, "[")?;
    let chunk_size = vec.len().checked_div(dims[depth]).unwrap_or(0).max(1);
    for chunk in vec.chunks(chunk_size) {
      write!(f, "\n{indent}")?;
      print_chunks(depth + 1, dims, chunk, f)?;
    }
    write!(f, "\n{}]", " ".repeat(depth * 2))
  }
}


pub struct TensorIterator<'a, T: Inner> {
  data: Ref<'a, Vec<T>>,
  shape_iter: Box<dyn Iterator<Item=usize> + 'a>,
}

impl<'a, T: Inner> TensorIterator<'a, T> {
  fn new(tensor: &'a Tensor<T>) -> Self {
    Self {
      data: tensor.data.borrow(),
      shape_iter: tensor.shape.iter(),
    }
  }
}

impl<T: Inner> Iterator for TensorIterator<'_, T> {
  type Item = T;

  fn next(&mut self) -> Option<Self::Item> {
    self.shape_iter.next().map(|i| self.data[i] )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::BaseOps;

  #[test]
  fn display() {
    let x = Tensor::vec(&[1.0f32, 2.0, 3.0]);
    assert_eq!(x.to_string(), "Tensor[3] [1.0, 2.0, 3.0]");

    let x = Tensor::scalar(4.0f32);
    assert_eq!(x.to_string(), "Tensor[] 4.0");

    let x = Tensor::new(&[2,2], vec![1, 2, 3, 4]);
    assert_eq!(x.to_string(), "Tensor[2, 2] [\n  [1, 2]\n  [3, 4]\n]");
  }

  #[test]
  fn broadcast() {
    let x = Tensor::new(&[1,2,3], vec![1, 2, 3, 4, 5, 6]);

    let y = Tensor::new(&[    1], vec![1]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 3, 4, 5, 6, 7]));

    let y = Tensor::new(&[    3], vec![1, 2, 3]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 4, 6, 5, 7, 9]));

    let y = Tensor::new(&[  2,3], vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 4, 6, 8, 10, 12]));
  }

  #[test]
  fn assign() {
    let x = Tensor::vec(&[1.0, 2.0]);
    let alias = x.clone();
    x.assign(&Tensor::vec(&[5.0, 6.0]));
    assert_eq!(alias, Tensor::vec(&[5.0, 6.0]));
  }

  #[test]
  #[should_panic(expected = "Could not assign")]
  fn assign_mismatch() {
    Tensor::vec(&[1.0, 2.0]).assign(&Tensor::vec(&[1.0]));
  }

  #[test]
  fn tracked_copies() {
    let x = Tensor::vec(&[1.0, 2.0]);
    let var = x.tracked();
    var.assign(&Tensor::vec(&[3.0, 4.0]));
    assert_eq!(x, Tensor::vec(&[1.0, 2.0]));
  }

  #[test]
  fn linspace() {
    let x = Tensor::<f64>::linspace(&[5], 0.0, 1.0);
    assert_eq!(x, Tensor::vec(&[0.0, 0.25, 0.5, 0.75, 1.0]));
    let x = Tensor::<f64>::linspace(&[1], 2.0, 3.0);
    assert_eq!(x, Tensor::vec(&[2.0]));
    assert_eq!(Tensor::<f64>::linspace(&[0], 0.0, 1.0).size(), 0);
  }

  #[test]
  fn constructors() {
    assert_eq!(Tensor::from_vec(vec![1, 2, 3]), Tensor::vec(&[1, 2, 3]));
    assert_eq!(Tensor::<f32>::ones(&[2,2]), Tensor::new(&[2,2], vec![1.0; 4]));
    assert_eq!(Tensor::arrange(&[3], 1, 2), Tensor::vec(&[1, 3, 5]));
  }

  #[test]
  fn contiguous() {
    let x = Tensor::vec(&[7.0f32]).broadcast(&Shape::new(&[3]));
    assert!(!x.shape().contiguous());
    let y = x.contiguous();
    assert!(y.shape().contiguous());
    assert_eq!(y.raw().len(), 3);
    assert_eq!(y, Tensor::vec(&[7.0, 7.0, 7.0]));

    let z = Tensor::vec(&[1.0f32, 2.0]);
    assert!(Rc::ptr_eq(&z.contiguous().data, &z.data));
  }

  #[test]
  fn randn() {
    let x = Tensor::<f64>::randn(&[5]);
    assert_eq!(x.size(), 5);
    assert!(x.param_iter().all(|a| a.is_finite() ));
  }
}
