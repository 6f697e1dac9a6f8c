//! Runtime error types.

use serde_json::Value;
use sluice_body::BodyError;
use sluice_config::ValueType;
use sluice_store::StoreError;
use sluice_workflow::ConfigurationError;

use crate::instance::LifecycleState;

/// Errors that can occur while driving a workflow instance.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
  /// The run reached quiescence with work left undone.
  #[error("workflow '{workflow}' deadlocked; unmet paths: {}", .unmet.join(", "))]
  Deadlock { workflow: String, unmet: Vec<String> },

  /// A node failed while firing.
  #[error("node '{node}' failed: {cause}")]
  NodeExecution {
    node: String,
    #[source]
    cause: NodeFault,
  },

  /// An operation was called out of lifecycle order.
  #[error("cannot {operation} while {state}")]
  Protocol {
    operation: &'static str,
    state: LifecycleState,
  },

  #[error("unknown inflow '{0}'")]
  UnknownInflow(String),

  #[error("unknown outflow '{0}'")]
  UnknownOutflow(String),

  /// The run exceeded the configured number of firings.
  #[error("workflow '{workflow}' exceeded the limit of {limit} firings")]
  FiringLimit { workflow: String, limit: u64 },

  #[error(transparent)]
  Configuration(#[from] ConfigurationError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Why a single node firing failed.
#[derive(Debug, thiserror::Error)]
pub enum NodeFault {
  #[error(transparent)]
  Body(#[from] BodyError),

  #[error("body did not produce output '{label}'")]
  MissingOutput { label: String },

  #[error("input '{label}' expected {expected}, got {actual}")]
  InputType {
    label: String,
    expected: ValueType,
    actual: Value,
  },

  #[error("output '{label}' expected {expected}, got {actual}")]
  OutputType {
    label: String,
    expected: ValueType,
    actual: Value,
  },

  #[error("unknown body '{0}'")]
  UnknownBody(String),

  #[error("nested workflow failed: {0}")]
  Subworkflow(Box<RunError>),
}
