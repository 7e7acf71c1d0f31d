use thiserror::Error;


/// Errors raised while running or persisting compiled computations.

#[derive(Debug, Error)]
pub enum Error {
  #[error("expected {expected} inputs, got {found}")]
  Arity { expected: usize, found: usize },

  #[error("input {index} has shape {found:?}, traced with {expected:?}")]
  ShapeMismatch { index: usize, expected: Vec<usize>, found: Vec<usize> },

  #[error("graph references unknown node {0}")]
  CorruptGraph(usize),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("graph encoding failed: {0}")]
  Codec(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
