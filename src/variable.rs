use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::fmt::Debug;

use serde::{ Serialize, Deserialize };

mod mops;
mod graph;

pub use graph::Graph;
pub use mops::{ UnaryMops, BinaryMops };

use crate::{
  internal::*,
  tensor::Tensor,
  shape::broadcast_dims,
  scalar::Real,
  ops::Hops,
};


pub(crate) fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


/// Unary computational operation that can be replayed
/// from a computation graph.

pub trait UnaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T>;
}


/// Binary computational operation that can be replayed
/// from a computation graph.

pub trait BinaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T>;
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Op {
  Unary(UnaryMops),
  Binary(BinaryMops),
}


impl Op {
  /// Dims of this op's result for operands of the given dims,
  /// or `None` if the operands don't fit the op.

  pub(crate) fn output_dims(&self, operands: &[&[usize]]) -> Option<Vec<usize>> {
    match (self, operands) {
      (Op::Unary(UnaryMops::Sum(_)), [_]) => Some(vec![]),
      (Op::Unary(_), [dims]) => Some(dims.to_vec()),
      (Op::Binary(_), [lhs, rhs]) => broadcast_dims(lhs, rhs),
      _ => None,
    }
  }
}


/// Node in a computation graph, holding a [Variable]'s data
/// and the operation used to create it.

#[derive(Debug)]
pub(crate) struct Node<T: Real> {
  pub id: usize,
  data: Tensor<T>,
  op: Option<Op>,
  previous: Vec<RcT<Self>>,
}

impl<T: Real> PartialEq for Node<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.id == rhs.id
  }
}

impl<T: Real> Node<T> {
  /// Recompute this node's data from its predecessors.
  /// Leaf nodes keep whatever data was last assigned to them.

  fn forward(&self) {
    if let Some(op) = &self.op {
      let lhs = &self.previous[0].data;
      let value = match op {
        Op::Unary(op) => op.as_unary_op().run(lhs),
        Op::Binary(op) => {
          let rhs = &self.previous[1].data;
          op.as_binary_op().run(lhs, rhs)
        },
      };
      self.data.assign(&value);
    }
  }
}


/// Variables record the computational operations used to create
/// them, so the computation can be replayed with new inputs.
///
/// They get created by calling [tracked](Tensor::tracked) on
/// any [Real] tensor.
///
/// Variables dereference to their underlying [Tensor] automatically for
/// read access. Operations from [ops](crate::ops), on the other hand,
/// always return another Variable.

#[derive(Debug, Clone)]
pub struct Variable<T: Real> {
  node: RcT<Node<T>>,
}

impl<T: Real> Hops<T> for Variable<T> {}

impl<T: Real> std::ops::Deref for Variable<T> {
  type Target = Tensor<T>;

  fn deref(&self) -> &Self::Target {
    &self.node.data
  }
}

impl<T: Real> PartialEq for Variable<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.node.data == rhs.node.data
  }
}

impl<T: Real> Variable<T> {
  pub(crate) fn from_tensor(tensor: Tensor<T>) -> Self {
    Self::from_node(Node {
      id: make_id(),
      data: tensor,
      op: None,
      previous: vec![],
    })
  }

  pub(crate) fn from_node(node: Node<T>) -> Self {
    Self { node: RcT::new(node) }
  }

  fn operation(op: Op, data: Tensor<T>, previous: Vec<RcT<Node<T>>>) -> Self {
    Self::from_node(Node {
      id: make_id(),
      data,
      op: Some(op),
      previous,
    })
  }

  pub fn id(&self) -> usize {
    self.node.id
  }

  pub fn tensor(&self) -> &Tensor<T> {
    &self.node.data
  }

  /// Whether this Variable was created by an operation,
  /// rather than being an input or a constant.

  pub fn is_computed(&self) -> bool {
    self.node.op.is_some()
  }

  pub fn unary_op(&self, op: impl UnaryOp<T> + Into<UnaryMops>) -> Self {
    let data = op.run(&self.node.data);
    Self::operation(
      Op::Unary(op.into()),
      data,
      vec![self.node.clone()],
    )
  }

  pub fn binary_op(&self, op: impl BinaryOp<T> + Into<BinaryMops>, rhs: &Self) -> Self {
    let data = op.run(&self.node.data, &rhs.node.data);
    Self::operation(
      Op::Binary(op.into()),
      data,
      vec![self.node.clone(), rhs.node.clone()],
    )
  }

  /// Reevaluate this Variable's graph to produce a new output.

  pub fn forward(&self) {
    for node in self.history() {
      node.forward();
    }
  }

  /// All leaf Variables this one was computed from.

  pub fn inputs(&self) -> Vec<Self> {
    self.history()
      .into_iter()
      .filter(|node| node.op.is_none() )
      .map(|node| Self { node } )
      .collect()
  }

  pub(crate) fn history(&self) -> Vec<RcT<Node<T>>> {
    let mut history = vec![];
    Self::history_recurse(&self.node, &mut history, &mut HashSet::new());
    history
  }

  fn history_recurse(node: &RcT<Node<T>>, history: &mut Vec<RcT<Node<T>>>, visited: &mut HashSet<usize>) {
    if visited.contains(&node.id) { return }
    visited.insert(node.id);
    for prev in &node.previous {
      Self::history_recurse(prev, history, visited);
    }
    history.push(node.clone());
  }

  /// Shadows [Tensor::tracked], which would otherwise be reachable
  /// through `Deref`. Variables are tracked already, so this always panics.

  pub fn tracked(&self) -> Self { panic!("Tensor is already being tracked") }
}

impl<T: Real> std::fmt::Display for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let title = if self.is_computed() { "Computed" } else { "Tracked" };
    write!(f, "{title} {}", self.tensor())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::{ NumericOps, RealOps };

  #[test]
  fn x_squared() {
    let x = Tensor::vec(&[3.0, 5.0]).tracked();
    let z = &x * &x + 2.0;
    assert_eq!(z, Tensor::vec(&[11.0, 27.0]).tracked());
    assert_eq!(z.inputs().len(), 2);
  }

  #[test]
  fn forward_replays() {
    let x = Tensor::vec(&[1.0, 2.0]).tracked();
    let y = x.sqr().exp().log();
    x.assign(&Tensor::vec(&[3.0, 4.0]));
    assert!(y.tensor().all_close(&Tensor::vec(&[1.0, 4.0]), 1e-9));
    y.forward();
    assert!(y.tensor().all_close(&Tensor::vec(&[9.0, 16.0]), 1e-9));
  }

  #[test]
  #[should_panic(expected = "already being tracked")]
  fn retracking_panics() {
    Tensor::vec(&[1.0f32]).tracked().tracked();
  }

  #[test]
  fn op_output_dims() {
    let sum = Op::Unary(UnaryMops::Sum(mops::Sum));
    let square = Op::Unary(UnaryMops::Square(mops::Square));
    let add = Op::Binary(BinaryMops::Add(mops::Add));
    assert_eq!(sum.output_dims(&[&[2, 3]]), Some(vec![]));
    assert_eq!(square.output_dims(&[&[2, 3]]), Some(vec![2, 3]));
    assert_eq!(add.output_dims(&[&[2, 3], &[3]]), Some(vec![2, 3]));
    assert_eq!(add.output_dims(&[&[2, 3], &[2]]), None);
    assert_eq!(square.output_dims(&[]), None);
    assert_eq!(add.output_dims(&[&[3]]), None);
  }

  #[test]
  fn shared_operand_recorded_once() {
    let x = Tensor::vec(&[2.0]).tracked();
    let y = &x * &x;
    assert_eq!(y.history().len(), 2);
    assert!(y.is_computed());
    assert!(!x.is_computed());
  }

  #[test]
  fn display() {
    let x = Tensor::vec(&[1.0f32]).tracked();
    assert_eq!(x.to_string(), "Tracked Tensor[1] [1.0]");
    assert_eq!(x.sqr().to_string(), "Computed Tensor[1] [1.0]");
  }
}
