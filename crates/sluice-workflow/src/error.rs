use thiserror::Error;

/// Static defects in a workflow definition, detected at configure time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
  #[error("invalid flow path '{path}': {reason}")]
  InvalidPath { path: String, reason: String },

  #[error("{what} name must not be empty")]
  EmptyName { what: String },

  #[error("duplicate node name '{node}' in workflow '{workflow}'")]
  DuplicateNode { workflow: String, node: String },

  #[error("no outflow matching inflow '{label}' ({path}) of node '{node}' in workflow '{workflow}'")]
  UnresolvedInflow {
    workflow: String,
    node: String,
    label: String,
    path: String,
  },

  #[error("no node produces external outflow '{key}' ({path}) of workflow '{workflow}'")]
  UnresolvedOutflow {
    workflow: String,
    key: String,
    path: String,
  },

  #[error("no node consumes inflow '{key}' ({path}) of composite workflow '{workflow}'")]
  UnconsumedInflow {
    workflow: String,
    key: String,
    path: String,
  },

  #[error("node '{node}' uses unknown body '{body}'")]
  UnknownBody { node: String, body: String },

  #[error("sequence '{label}' of node '{node}' has {actual} elements, expected {expected}")]
  SequenceLength {
    node: String,
    label: String,
    expected: usize,
    actual: usize,
  },

  #[error("multiple input sources with label '{label}' on node '{node}'")]
  BindingConflict { node: String, label: String },

  #[error("path {path} in workflow '{workflow}' has multiple producers: {producers:?}")]
  DuplicateProducer {
    workflow: String,
    path: String,
    producers: Vec<String>,
  },
}
