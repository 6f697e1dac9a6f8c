use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::node::Node;
use crate::path::{FlowPath, Namespace};

/// A compiled workflow ready to be instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub name: String,
  pub namespace: Namespace,
  /// Nodes in declaration order; the scheduler visits them in this order.
  pub nodes: Vec<Node>,
  /// Caller-facing inflow keys and the paths they feed.
  pub inflows: BTreeMap<String, FlowPath>,
  /// Caller-facing outflow keys and the paths they drain.
  pub outflows: BTreeMap<String, FlowPath>,
}

impl Workflow {
  /// Build the producer/consumer tables for this level.
  pub fn graph(&self) -> Graph {
    Graph::new(self)
  }

  /// Get a node by name.
  pub fn node(&self, name: &str) -> Option<&Node> {
    self.nodes.iter().find(|node| node.name == name)
  }

  pub fn inflow(&self, key: &str) -> Option<&FlowPath> {
    self.inflows.get(key)
  }

  pub fn outflow(&self, key: &str) -> Option<&FlowPath> {
    self.outflows.get(key)
  }
}
