// This example demonstrates compiling a function with multiple inputs
// and outputs, saving the traced graph to a file and replaying it elsewhere,
// without access to the original code.

use microjit::{ ops::*, compile_multi, CompileOptions, Graph, Tensor, Variable };

fn model(inputs: &[Variable<f32>]) -> Vec<Variable<f32>> {
  let hidden = (&inputs[0] * &inputs[1]).sigmoid();
  let loss = (&hidden - 0.5).sqr().mean();
  vec![hidden, loss]
}

fn main() -> microjit::Result<()> {
  let filename = "model.nn";

  let compiled = compile_multi(model, CompileOptions::default());

  let x = Tensor::vec(&[1.0, 2.0]);
  let w = Tensor::randn(&[2]);

  // The first call traces ..
  let outputs = compiled.run(&[&x, &w])?;
  println!("loss is {}", outputs[1].item());

  // .. subsequent calls replay the recorded graph
  let outputs = compiled.run(&[&Tensor::vec(&[3.0, 4.0]), &w])?;
  println!("loss is now {}", outputs[1].item());

  // Save the traced graph and load it elsewhere
  compiled.graph_for(&[&x, &w])?.save(filename)?;
  let graph = Graph::<f32>::load(filename)?;

  // Feed new data using #run
  graph.run(&[&Tensor::vec(&[5.0, 6.0]), &w])?;
  println!("loaded graph computes {}", graph.outputs[1].item());

  std::fs::remove_file(filename)?;
  Ok(())
}
