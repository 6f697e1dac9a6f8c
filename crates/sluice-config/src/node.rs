use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::binding::{InflowDef, OutflowDef};
use crate::types::ValueType;

/// A node in a workflow definition.
///
/// Binding maps are keyed by the node-local name. For composite nodes the
/// local names are flow paths inside the nested workflow: an inflow
/// `"/multiplier": "/inputNumber"` feeds the parent's `/inputNumber` into the
/// child's `/multiplier`, and an outflow `"/product": "/outputNumber"`
/// publishes the child's `/product` to the parent's `/outputNumber`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  /// Node name, unique within its workflow. Empty names are assigned one.
  #[serde(default)]
  pub name: String,
  #[serde(flatten)]
  pub node_type: NodeType,
  #[serde(default)]
  pub inflows: BTreeMap<String, InflowDef>,
  #[serde(default)]
  pub outflows: BTreeMap<String, OutflowDef>,
  /// Declared types of local names (inputs and outputs).
  #[serde(default)]
  pub types: BTreeMap<String, ValueType>,
  /// Fixed values passed to the body on every firing.
  #[serde(default)]
  pub constants: BTreeMap<String, serde_json::Value>,
  /// Multi-valued parameters; the node fires once per element.
  #[serde(default)]
  pub sequences: BTreeMap<String, Vec<serde_json::Value>>,
  /// State variables with their initial values. Each firing sees the current
  /// value, and a body output of the same name replaces it for the next one.
  #[serde(default)]
  pub state: BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub firing: FiringPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeType {
  /// A node whose body is a named callable from the body registry.
  Leaf {
    body: String,
  },
  /// A node whose body is an entire nested workflow.
  Composite {
    nodes: Vec<NodeDef>,
  },
}

/// How many times a node may fire within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringPolicy {
  /// Fire whenever inputs are available.
  #[default]
  Repeatable,
  /// Fire at most once per run.
  Once,
}

impl NodeDef {
  /// Create a leaf node bound to the named body.
  pub fn leaf(name: impl Into<String>, body: impl Into<String>) -> Self {
    Self::with_type(name, NodeType::Leaf { body: body.into() })
  }

  /// Create a composite node wrapping the given nested nodes.
  pub fn composite(name: impl Into<String>, nodes: Vec<NodeDef>) -> Self {
    Self::with_type(name, NodeType::Composite { nodes })
  }

  fn with_type(name: impl Into<String>, node_type: NodeType) -> Self {
    Self {
      name: name.into(),
      node_type,
      inflows: BTreeMap::new(),
      outflows: BTreeMap::new(),
      types: BTreeMap::new(),
      constants: BTreeMap::new(),
      sequences: BTreeMap::new(),
      state: BTreeMap::new(),
      firing: FiringPolicy::default(),
    }
  }

  pub fn inflow(mut self, local: impl Into<String>, path: &str) -> Self {
    self.inflows.insert(local.into(), InflowDef::from(path));
    self
  }

  pub fn inflow_def(mut self, local: impl Into<String>, inflow: InflowDef) -> Self {
    self.inflows.insert(local.into(), inflow);
    self
  }

  pub fn outflow(mut self, local: impl Into<String>, path: &str) -> Self {
    self.outflows.insert(local.into(), OutflowDef::from(path));
    self
  }

  pub fn typed(mut self, local: impl Into<String>, value_type: ValueType) -> Self {
    self.types.insert(local.into(), value_type);
    self
  }

  pub fn constant(mut self, local: impl Into<String>, value: serde_json::Value) -> Self {
    self.constants.insert(local.into(), value);
    self
  }

  pub fn sequence(mut self, local: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
    self.sequences.insert(local.into(), values);
    self
  }

  pub fn state(mut self, local: impl Into<String>, initial: serde_json::Value) -> Self {
    self.state.insert(local.into(), initial);
    self
  }

  pub fn once(mut self) -> Self {
    self.firing = FiringPolicy::Once;
    self
  }
}
