// Compiles the built-in square operation, applies it to a fixed
// tensor and reports input and result on stdout.

use std::path::PathBuf;

use anyhow::{ Context, Result };
use clap::{ Parser, ValueEnum };
use log::{ info, LevelFilter };

use microjit::{ compile_with, ops::square, CompileOptions, Mode, Tensor };

/// Square a tensor with a compiled operation
#[derive(Parser, Debug)]
#[command(name = "compile_square")]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Execution mode of the compiled operation
  #[arg(short, long, value_enum, default_value_t = CliMode::Traced)]
  mode: CliMode,

  /// Save the traced graph to this file
  #[arg(long, value_name = "FILE")]
  save_graph: Option<PathBuf>,

  /// Verbose output (repeat for more)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
  Eager,
  Traced,
}

impl From<CliMode> for Mode {
  fn from(mode: CliMode) -> Self {
    match mode {
      CliMode::Eager => Mode::Eager,
      CliMode::Traced => Mode::Traced,
    }
  }
}

fn main() -> Result<()> {
  let args = Args::parse();
  init_logging(args.verbose);

  let compiled_square = compile_with(square, CompileOptions::default().mode(args.mode.into()));

  let input = Tensor::vec(&[1.0f32, 2.0, 3.0]);
  let result = compiled_square.call(&input)
    .context("Failed to run compiled square")?;

  println!("Input: {input}");
  println!("Result: {result}");

  if let Some(path) = &args.save_graph {
    let graph = compiled_square.graph_for(&[&input])?;
    graph.save(path)
      .with_context(|| format!("Failed to save graph to {}", path.display()))?;
    info!("Saved traced graph to {}", path.display());
  }

  Ok(())
}

fn init_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .init();
}
