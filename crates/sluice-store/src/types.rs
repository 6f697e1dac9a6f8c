use serde::Serialize;
use serde_json::Value;
use sluice_config::ValueType;
use sluice_workflow::{Endpoint, FlowPath};

/// A value that is still waiting for one or more consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingValue {
  pub path: FlowPath,
  pub value: Value,
  pub value_type: ValueType,
  pub producer: Endpoint,
  /// Consumers that have not taken the value yet.
  pub consumers: Vec<Endpoint>,
}
