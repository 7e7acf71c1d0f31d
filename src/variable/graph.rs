use std::fs;
use std::path::Path;
use std::collections::HashMap;

use itertools::Itertools;
use log::trace;
use serde::{ Serialize, Deserialize, de::DeserializeOwned };

use crate::{
  internal::*,
  error::{ Error, Result },
  ops::BaseOps,
  scalar::Real,
  shape::Shape,
  variable::{ Variable, Node, Op, make_id },
  Tensor,
};


/// Snapshot of a computation graph with defined inputs and outputs.
///
/// Can be used for recomputing the entire graph with new input data
/// or saving it to disc.

#[derive(Debug, Clone)]
pub struct Graph<T: Real + 'static> {
  pub inputs: Vec<Variable<T>>,
  pub outputs: Vec<Variable<T>>,
}

impl<T: Real + 'static> Graph<T> {
  pub fn new(inputs: &[Variable<T>], outputs: &[Variable<T>]) -> Self {
    Self {
      inputs: inputs.into(),
      outputs: outputs.into(),
    }
  }

  /// Feed new data into the graph's inputs and recompute all outputs.
  ///
  /// Inputs must match the traced inputs in number and shape.

  pub fn run(&self, inputs: &[&Tensor<T>]) -> Result<()> {
    if inputs.len() != self.inputs.len() {
      return Err(Error::Arity { expected: self.inputs.len(), found: inputs.len() })
    }
    for (index, (input, data)) in self.inputs.iter().zip(inputs).enumerate() {
      if input.shape().dims != data.shape().dims {
        return Err(Error::ShapeMismatch {
          index,
          expected: input.shape().dims.clone(),
          found: data.shape().dims.clone(),
        })
      }
    }
    for (input, data) in self.inputs.iter().zip(inputs) {
      input.assign(data);
    }
    let history = self.history();
    trace!("Replaying {} graph nodes", history.len());
    for node in history {
      node.forward();
    }
    Ok(())
  }

  /// Detached copies of the current outputs.

  pub fn results(&self) -> Vec<Tensor<T>> {
    self.outputs.iter().map(|output| output.detach() ).collect()
  }

  /// Number of nodes and number of operations in this graph.

  pub fn statistics(&self) -> (usize, usize) {
    let history = self.history();
    let num_ops = history.iter().filter(|node| node.op.is_some() ).count();
    (history.len(), num_ops)
  }

  fn history(&self) -> Vec<RcT<Node<T>>> {
    let mut history = self.outputs
      .iter()
      .map(|out| out.history() )
      .collect::<Vec<_>>()
      .concat();
    history.sort_by_key(|node| node.id );
    history.into_iter().unique_by(|node| node.id ).collect()
  }
}

impl<T: Real + Serialize + DeserializeOwned + 'static> Graph<T> {
  /// Restore a graph written by [save](Graph::save).
  ///
  /// Operation nodes are recomputed from the stored inputs
  /// and constants before the graph is returned. Nodes whose
  /// operands or dims don't fit together are rejected with
  /// [Error::CorruptGraph].

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let bytes = fs::read(path)?;
    let dump: GraphDump<T> = postcard::from_bytes(&bytes)?;
    let mut nodes: HashMap<usize, RcT<Node<T>>> = HashMap::new();
    for node in dump.history {
      let previous = node.previous.iter()
        .map(|id| nodes.get(id).cloned().ok_or(Error::CorruptGraph(*id)) )
        .collect::<Result<Vec<_>>>()?;
      let data = match (&node.op, node.data) {
        (None, Some(data)) => {
          // Stored leaves must be dense and match their recorded dims
          let shape = data.shape();
          if *shape != Shape::new(&node.dims) || data.raw().len() != shape.size() {
            return Err(Error::CorruptGraph(node.id))
          }
          data
        },
        (None, None) => Tensor::zeros(&node.dims),
        (Some(op), _) => {
          let operands: Vec<&[usize]> = previous.iter()
            .map(|prev| &prev.data.shape().dims[..] )
            .collect();
          if op.output_dims(&operands).as_deref() != Some(&node.dims[..]) {
            return Err(Error::CorruptGraph(node.id))
          }
          Tensor::zeros(&node.dims)
        },
      };
      let restored = Node {
        id: make_id(),
        data,
        op: node.op,
        previous,
      };
      nodes.insert(node.id, RcT::new(restored));
    }
    let lookup = |id: usize| nodes.get(&id)
      .map(|node| Variable { node: node.clone() } )
      .ok_or(Error::CorruptGraph(id));
    let graph = Graph {
      inputs: dump.inputs.into_iter().map(lookup).collect::<Result<_>>()?,
      outputs: dump.outputs.into_iter().map(lookup).collect::<Result<_>>()?,
    };
    for node in graph.history() {
      node.forward();
    }
    Ok(graph)
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let history = self.history().iter().map(|node| NodeDump {
      id: node.id,
      // Computed data gets restored by replaying the graph
      data: node.op.is_none().then(|| node.data.detach() ),
      dims: node.data.shape().dims.clone(),
      op: node.op.clone(),
      previous: node.previous.iter().map(|prev| prev.id ).collect(),
    }).collect();

    let dump = GraphDump {
      history,
      inputs: self.inputs.iter().map(|input| input.id() ).collect(),
      outputs: self.outputs.iter().map(|output| output.id() ).collect(),
    };

    let bytes: Vec<u8> = postcard::to_allocvec(&dump)?;
    fs::write(path, bytes)?;
    Ok(())
  }
}

#[derive(Serialize, Deserialize)]
struct NodeDump<T: Real> {
  id: usize,
  data: Option<Tensor<T>>,
  dims: Vec<usize>,
  op: Option<Op>,
  previous: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct GraphDump<T: Real> {
  history: Vec<NodeDump<T>>,
  inputs: Vec<usize>,
  outputs: Vec<usize>,
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::{ NumericOps, RealOps };
  use crate::variable::mops::{ Square, Add, Mul };

  fn temp_file(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("microjit-{}-{name}", std::process::id()))
  }

  fn build() -> Graph<f64> {
    let x = Tensor::vec(&[1.0, 2.0]).tracked();
    let y = Tensor::vec(&[0.5, 0.5]).tracked();
    let z = (&x * &y).exp().sum();
    Graph::new(&[x, y], &[z])
  }

  #[test]
  fn run() {
    let graph = build();
    graph.run(&[&Tensor::vec(&[0.0, 0.0]), &Tensor::vec(&[1.0, 1.0])]).unwrap();
    assert_eq!(graph.results(), vec![Tensor::scalar(2.0)]);
  }

  #[test]
  fn statistics() {
    assert_eq!(build().statistics(), (5, 3));
  }

  #[test]
  fn arity_mismatch() {
    let graph = build();
    let result = graph.run(&[&Tensor::vec(&[0.0, 0.0])]);
    assert!(matches!(result, Err(Error::Arity { expected: 2, found: 1 })));
  }

  #[test]
  fn shape_mismatch() {
    let graph = build();
    let result = graph.run(&[&Tensor::vec(&[0.0, 0.0]), &Tensor::vec(&[1.0])]);
    assert!(matches!(result, Err(Error::ShapeMismatch { index: 1, .. })));
  }

  #[test]
  fn save_and_reload() {
    let path = temp_file("graph.nn");
    let original = build();
    original.save(&path).unwrap();

    let loaded = Graph::<f64>::load(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(loaded.results(), original.results());

    // Constants survive, inputs accept new data
    let x = Tensor::vec(&[1.0f64, 2.0]).tracked();
    let doubled = Graph::new(&[x.clone()], &[&x * 2.0]);
    doubled.save(&path).unwrap();
    let loaded = Graph::<f64>::load(&path).unwrap();
    fs::remove_file(&path).unwrap();
    loaded.run(&[&Tensor::vec(&[3.0, 4.0])]).unwrap();
    assert_eq!(loaded.results(), vec![Tensor::vec(&[6.0, 8.0])]);
  }

  #[test]
  fn load_corrupt() {
    let path = temp_file("corrupt.nn");
    let dump = GraphDump::<f64> { history: vec![], inputs: vec![7], outputs: vec![] };
    fs::write(&path, postcard::to_allocvec(&dump).unwrap()).unwrap();
    let result = Graph::<f64>::load(&path);
    fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(Error::CorruptGraph(7))));
  }

  #[test]
  fn load_malformed_nodes() {
    let path = temp_file("malformed.nn");
    let leaf = |id, data: Tensor<f64>, dims: Vec<usize>| NodeDump {
      id, data: Some(data), dims, op: None, previous: vec![],
    };
    let load = |history: Vec<NodeDump<f64>>, output: usize| {
      let dump = GraphDump { history, inputs: vec![0], outputs: vec![output] };
      fs::write(&path, postcard::to_allocvec(&dump).unwrap()).unwrap();
      let result = Graph::<f64>::load(&path);
      fs::remove_file(&path).unwrap();
      result
    };

    // Unary op without operand
    let result = load(vec![
      leaf(0, Tensor::vec(&[1.0, 2.0, 3.0]), vec![3]),
      NodeDump { id: 1, data: None, dims: vec![3], op: Some(Op::Unary(Square.into())), previous: vec![] },
    ], 1);
    assert!(matches!(result, Err(Error::CorruptGraph(1))));

    // Binary op with a single operand
    let result = load(vec![
      leaf(0, Tensor::vec(&[1.0, 2.0, 3.0]), vec![3]),
      NodeDump { id: 1, data: None, dims: vec![3], op: Some(Op::Binary(Add.into())), previous: vec![0] },
    ], 1);
    assert!(matches!(result, Err(Error::CorruptGraph(1))));

    // Leaf data disagreeing with its dims
    let result = load(vec![leaf(0, Tensor::vec(&[1.0]), vec![3])], 0);
    assert!(matches!(result, Err(Error::CorruptGraph(0))));

    // Op dims disagreeing with its operands
    let result = load(vec![
      leaf(0, Tensor::vec(&[1.0, 2.0, 3.0]), vec![3]),
      NodeDump { id: 1, data: None, dims: vec![2], op: Some(Op::Unary(Square.into())), previous: vec![0] },
    ], 1);
    assert!(matches!(result, Err(Error::CorruptGraph(1))));

    // Operands that can't be broadcast
    let result = load(vec![
      leaf(0, Tensor::vec(&[1.0, 2.0, 3.0]), vec![3]),
      leaf(1, Tensor::vec(&[1.0, 2.0]), vec![2]),
      NodeDump { id: 2, data: None, dims: vec![3], op: Some(Op::Binary(Mul.into())), previous: vec![0, 1] },
    ], 2);
    assert!(matches!(result, Err(Error::CorruptGraph(2))));

    // Stored tensor whose storage is shorter than its shape
    #[derive(Serialize)]
    struct RawTensor { shape: Shape, data: Vec<f64> }
    let bytes = postcard::to_allocvec(&RawTensor { shape: Shape::new(&[3]), data: vec![1.0] }).unwrap();
    let short: Tensor<f64> = postcard::from_bytes(&bytes).unwrap();
    let result = load(vec![leaf(0, short, vec![3])], 0);
    assert!(matches!(result, Err(Error::CorruptGraph(0))));
  }
}
