use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_config::ValueType;

use crate::path::FlowPath;
use crate::workflow::Workflow;

/// A compiled node with every binding resolved to an absolute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub name: String,
  pub kind: NodeKind,
  pub inputs: Vec<InputBinding>,
  pub outputs: Vec<OutputBinding>,
  pub types: BTreeMap<String, ValueType>,
  pub constants: BTreeMap<String, Value>,
  pub sequences: BTreeMap<String, Vec<Value>>,
  /// Initial values of state variables carried between firings of one run.
  pub state: BTreeMap<String, Value>,
  /// Maximum firings per run; `None` means unbounded.
  pub firing_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  Leaf { body: String },
  /// Boundary keys of the nested workflow are the labels of this node's
  /// input and output bindings.
  Composite { workflow: Box<Workflow> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
  pub label: String,
  pub path: FlowPath,
  pub receive_once: bool,
  /// Does not gate firing.
  pub optional: bool,
  /// Bound in place of a missing optional value.
  pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBinding {
  pub label: String,
  pub path: FlowPath,
  pub nullable: bool,
}

impl Node {
  pub fn is_composite(&self) -> bool {
    matches!(self.kind, NodeKind::Composite { .. })
  }

  /// Length of this node's sequences, if it has any.
  pub fn sequence_len(&self) -> Option<usize> {
    self.sequences.values().next().map(Vec::len)
  }

  /// Inputs that must hold a value before the node can fire.
  pub fn required_inputs(&self) -> impl Iterator<Item = &InputBinding> {
    self.inputs.iter().filter(|input| !input.optional)
  }

  pub fn declared_type(&self, label: &str) -> ValueType {
    self.types.get(label).copied().unwrap_or_default()
  }

  /// Sequence elements bound for the zero-based firing `index`.
  pub fn sequence_elements(&self, index: usize) -> BTreeMap<String, Value> {
    self
      .sequences
      .iter()
      .filter_map(|(label, values)| values.get(index).map(|v| (label.clone(), v.clone())))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn leaf() -> Node {
    Node {
      name: "greeter".to_string(),
      kind: NodeKind::Leaf {
        body: "identity".to_string(),
      },
      inputs: vec![],
      outputs: vec![],
      types: BTreeMap::from([("n".to_string(), ValueType::Integer)]),
      constants: BTreeMap::new(),
      sequences: BTreeMap::from([
        ("g".to_string(), vec![json!("Hello"), json!("Bye")]),
        ("n".to_string(), vec![json!(1), json!(2)]),
      ]),
      state: BTreeMap::new(),
      firing_limit: Some(2),
    }
  }

  #[test]
  fn test_sequence_elements() {
    let node = leaf();
    assert_eq!(node.sequence_len(), Some(2));

    let second = node.sequence_elements(1);
    assert_eq!(second["g"], json!("Bye"));
    assert_eq!(second["n"], json!(2));
    assert!(node.sequence_elements(2).is_empty());
  }

  #[test]
  fn test_declared_type_defaults_to_any() {
    let node = leaf();
    assert_eq!(node.declared_type("n"), ValueType::Integer);
    assert_eq!(node.declared_type("g"), ValueType::Any);
    assert!(!node.is_composite());
  }
}
