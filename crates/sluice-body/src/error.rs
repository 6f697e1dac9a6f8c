use thiserror::Error;

/// A fault raised by a node body.
#[derive(Debug, Error)]
pub enum BodyError {
  /// A required input was not bound.
  #[error("missing input '{name}'")]
  MissingInput { name: String },

  /// An input had a value the body cannot work with.
  #[error("invalid input '{name}': expected {expected}, got {actual}")]
  InvalidInput {
    name: String,
    expected: String,
    actual: serde_json::Value,
  },

  /// Arithmetic overflowed the integer range.
  #[error("integer overflow")]
  Overflow,

  /// Template rendering failed.
  #[error("template error: {0}")]
  Template(#[from] minijinja::Error),

  /// Any other failure reported by the body.
  #[error("{0}")]
  Failed(String),
}

impl BodyError {
  pub fn failed(message: impl Into<String>) -> Self {
    BodyError::Failed(message.into())
  }
}
