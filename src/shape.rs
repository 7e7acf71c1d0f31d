use serde::{ Serialize, Deserialize };


/// The shape of a [Tensor](crate::Tensor), along with the strides
/// and offset used to walk its storage.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
  pub dims: Vec<usize>,
  pub(crate) strides: Vec<isize>,
  pub(crate) offset: usize,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self {
      dims: dims.to_vec(),
      strides: Self::make_strides(dims),
      offset: 0,
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = vec![1; dims.len()];
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] as isize * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  pub fn contiguous(&self) -> bool {
    self.strides == Self::make_strides(&self.dims)
  }

  /// Storage indices of all elements, in row-major order.

  pub fn iter(&self) -> Box<dyn Iterator<Item=usize> + '_> {
    if self.contiguous() {
      Box::new(self.offset..self.offset + self.size())
    } else {
      Box::new(ShapeIterator::new(self))
    }
  }

  /// Stretch this shape to the common shape of `self` and `other`.
  ///
  /// Dimensions are matched from the back. Stretched dimensions
  /// get a stride of zero, so no data needs to be copied.

  pub fn broadcast(&self, other: &Self) -> Self {
    let rank = self.rank().max(other.rank());
    let mut dims = vec![0; rank];
    let mut strides = vec![0; rank];
    for d in 0..rank {
      let own = (d < self.rank()).then(|| self.rank() - 1 - d);
      let dl = own.map_or(1, |i| self.dims[i] );
      let dr = if d < other.rank() { other.dims[other.rank() - 1 - d] } else { 1 };
      assert!(dl == dr || dl == 1 || dr == 1, "Could not broadcast {} & {}", self, other);
      let out = rank - 1 - d;
      dims[out] = dl.max(dr);
      strides[out] = match own {
        Some(i) if !(dl == 1 && dr != 1) => self.strides[i],
        _ => 0,
      };
    }
    Self { dims, strides, offset: self.offset }
  }
}

/// Common dims of two broadcast-compatible shapes.

pub(crate) fn broadcast_dims(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
  let rank = lhs.len().max(rhs.len());
  let mut dims = vec![0; rank];
  for d in 0..rank {
    let dl = if d < lhs.len() { lhs[lhs.len() - 1 - d] } else { 1 };
    let dr = if d < rhs.len() { rhs[rhs.len() - 1 - d] } else { 1 };
    if dl != dr && dl != 1 && dr != 1 { return None }
    dims[rank - 1 - d] = dl.max(dr);
  }
  Some(dims)
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


/// Iterate through a strided [Shape]'s storage indices.

pub struct ShapeIterator<'a> {
  shape: &'a Shape,
  counter: Vec<usize>,
  remaining: usize,
}

impl<'a> ShapeIterator<'a> {
  fn new(shape: &'a Shape) -> Self {
    Self {
      counter: vec![0; shape.rank()],
      remaining: shape.size(),
      shape,
    }
  }
}

impl Iterator for ShapeIterator<'_> {
  type Item = usize;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 { return None }
    self.remaining -= 1;
    let index = self.counter.iter()
      .zip(&self.shape.strides)
      .map(|(&i, &s)| i as isize * s )
      .sum::<isize>() + self.shape.offset as isize;
    // Carry over into the next dimension on a full turn
    for d in (0..self.counter.len()).rev() {
      self.counter[d] += 1;
      if self.counter[d] < self.shape.dims[d] { break }
      self.counter[d] = 0;
    }
    Some(index as usize)
  }
}
