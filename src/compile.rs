use std::cell::RefCell;
use std::collections::HashMap;

use log::{ debug, trace, warn };

use crate::{
  error::{ Error, Result },
  ops::BaseOps,
  scalar::Real,
  variable::{ Variable, Graph },
  Tensor,
};


/// How a [Compiled] function gets executed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
  /// Run the original function on every call.
  Eager,
  /// Trace the function once per input signature and
  /// replay the recorded graph on subsequent calls.
  #[default]
  Traced,
}


/// Settings for [compile_with] and [compile_multi].

#[derive(Debug, Clone)]
pub struct CompileOptions {
  pub mode: Mode,
  /// Maximum number of input signatures to keep traces for.
  /// New signatures beyond this limit run eagerly.
  pub cache_limit: usize,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      mode: Mode::Traced,
      cache_limit: 8,
    }
  }
}

impl CompileOptions {
  pub fn mode(mut self, mode: Mode) -> Self {
    self.mode = mode;
    self
  }

  pub fn cache_limit(mut self, limit: usize) -> Self {
    self.cache_limit = limit;
    self
  }
}


type Function<T> = Box<dyn Fn(&[Variable<T>]) -> Vec<Variable<T>>>;

type Signature = Vec<Vec<usize>>;


/// A function over tensors, compiled into replayable graphs.
///
/// Produces the same results as calling the original function
/// eagerly. The first call for every new input signature pays
/// for tracing the function.
///
/// ```
/// use microjit::{ compile, ops::square, Tensor };
///
/// let compiled = compile(square);
/// let result = compiled.call(&Tensor::vec(&[1.0, 2.0, 3.0])).unwrap();
/// assert_eq!(result, Tensor::vec(&[1.0, 4.0, 9.0]));
/// ```

pub struct Compiled<T: Real + 'static> {
  function: Function<T>,
  arity: Option<usize>,
  options: CompileOptions,
  traces: RefCell<HashMap<Signature, Graph<T>>>,
}

/// Compile a unary function using default options.

pub fn compile<T, F>(function: F) -> Compiled<T>
where
  T: Real + 'static,
  F: Fn(&Variable<T>) -> Variable<T> + 'static,
{
  compile_with(function, CompileOptions::default())
}

/// Compile a unary function.

pub fn compile_with<T, F>(function: F, options: CompileOptions) -> Compiled<T>
where
  T: Real + 'static,
  F: Fn(&Variable<T>) -> Variable<T> + 'static,
{
  let mut compiled = compile_multi(move |inputs: &[Variable<T>]| vec![function(&inputs[0])], options);
  compiled.arity = Some(1);
  compiled
}

/// Compile a function with any number of inputs and outputs.

pub fn compile_multi<T, F>(function: F, options: CompileOptions) -> Compiled<T>
where
  T: Real + 'static,
  F: Fn(&[Variable<T>]) -> Vec<Variable<T>> + 'static,
{
  Compiled {
    function: Box::new(function),
    arity: None,
    options,
    traces: RefCell::new(HashMap::new()),
  }
}

impl<T: Real + 'static> Compiled<T> {
  /// Apply a unary compiled function.

  pub fn call(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
    let mut outputs = self.run(&[input])?;
    if outputs.is_empty() {
      return Err(Error::Arity { expected: 1, found: 0 })
    }
    Ok(outputs.swap_remove(0))
  }

  /// Apply the compiled function to any number of inputs.
  ///
  /// Returned tensors never share storage with the traced graph.

  pub fn run(&self, inputs: &[&Tensor<T>]) -> Result<Vec<Tensor<T>>> {
    if let Some(arity) = self.arity {
      if inputs.len() != arity {
        return Err(Error::Arity { expected: arity, found: inputs.len() })
      }
    }
    match self.options.mode {
      Mode::Eager => Ok(self.eager(inputs)),
      Mode::Traced => self.traced(inputs),
    }
  }

  /// Number of input signatures traced so far.

  pub fn num_traces(&self) -> usize {
    self.traces.borrow().len()
  }

  pub fn options(&self) -> &CompileOptions {
    &self.options
  }

  /// The graph recorded for the signature of `inputs`.
  ///
  /// Traces the function if no graph has been cached for these
  /// inputs, without adding it to the cache.

  pub fn graph_for(&self, inputs: &[&Tensor<T>]) -> Result<Graph<T>> {
    if let Some(graph) = self.traces.borrow().get(&signature(inputs)) {
      return Ok(graph.clone())
    }
    if let Some(arity) = self.arity {
      if inputs.len() != arity {
        return Err(Error::Arity { expected: arity, found: inputs.len() })
      }
    }
    Ok(self.trace(inputs))
  }

  fn eager(&self, inputs: &[&Tensor<T>]) -> Vec<Tensor<T>> {
    let variables: Vec<_> = inputs.iter().map(|input| input.tracked() ).collect();
    (self.function)(&variables)
      .iter()
      .map(|output| output.detach() )
      .collect()
  }

  fn trace(&self, inputs: &[&Tensor<T>]) -> Graph<T> {
    let variables: Vec<_> = inputs.iter().map(|input| input.tracked() ).collect();
    let outputs = (self.function)(&variables);
    Graph::new(&variables, &outputs)
  }

  fn traced(&self, inputs: &[&Tensor<T>]) -> Result<Vec<Tensor<T>>> {
    let signature = signature(inputs);

    if let Some(graph) = self.traces.borrow().get(&signature) {
      trace!("Replaying trace for input shapes {:?}", signature);
      graph.run(inputs)?;
      return Ok(graph.results())
    }

    if self.num_traces() >= self.options.cache_limit {
      warn!("Trace cache limit of {} reached, running input shapes {:?} eagerly",
        self.options.cache_limit, signature);
      return Ok(self.eager(inputs))
    }

    let graph = self.trace(inputs);
    let (num_nodes, num_ops) = graph.statistics();
    debug!("Traced graph for input shapes {:?}: {} nodes, {} ops", signature, num_nodes, num_ops);
    let results = graph.results();
    self.traces.borrow_mut().insert(signature, graph);
    Ok(results)
  }
}

fn signature<T: Real>(inputs: &[&Tensor<T>]) -> Signature {
  inputs.iter().map(|input| input.shape().dims.clone() ).collect()
}
