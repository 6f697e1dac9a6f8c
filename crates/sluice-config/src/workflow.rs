use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::NodeDef;

/// A workflow definition as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  /// External inflows: caller key -> rooted flow path.
  #[serde(default)]
  pub inflows: BTreeMap<String, String>,
  /// External outflows: caller key -> rooted flow path.
  #[serde(default)]
  pub outflows: BTreeMap<String, String>,
  /// Nodes in declaration order. The order is the scheduler's tie-break.
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
}

impl WorkflowDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      inflows: BTreeMap::new(),
      outflows: BTreeMap::new(),
      nodes: Vec::new(),
    }
  }

  pub fn inflow(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
    self.inflows.insert(key.into(), path.into());
    self
  }

  pub fn outflow(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
    self.outflows.insert(key.into(), path.into());
    self
  }

  pub fn node(mut self, node: NodeDef) -> Self {
    self.nodes.push(node);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_defaults() {
    let def: WorkflowDef = serde_json::from_value(json!({ "name": "empty" })).unwrap();
    assert_eq!(def.name, "empty");
    assert!(def.inflows.is_empty());
    assert!(def.nodes.is_empty());
  }

  #[test]
  fn test_roundtrip_preserves_node_order() {
    let def = WorkflowDef::new("ordered")
      .node(NodeDef::leaf("b", "identity"))
      .node(NodeDef::leaf("a", "identity"));

    let text = serde_json::to_string(&def).unwrap();
    let back: WorkflowDef = serde_json::from_str(&text).unwrap();

    assert_eq!(back, def);
    assert_eq!(back.nodes[0].name, "b");
  }
}
