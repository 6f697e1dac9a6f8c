use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::FlowPath;
use crate::workflow::Workflow;

/// Something that produces into or consumes from a flow path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Endpoint {
  /// A node of the workflow.
  Node(String),
  /// A caller-facing inflow or outflow key of the workflow.
  External(String),
}

impl Endpoint {
  pub fn node(name: impl Into<String>) -> Self {
    Endpoint::Node(name.into())
  }

  pub fn external(key: impl Into<String>) -> Self {
    Endpoint::External(key.into())
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Endpoint::Node(name) => write!(f, "node '{}'", name),
      Endpoint::External(key) => write!(f, "external '{}'", key),
    }
  }
}

/// Producer and consumer tables of one workflow level.
///
/// Nested workflows get their own graph; composite boundaries appear here
/// only as the composite node's own bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
  /// path -> endpoints writing to it, in declaration order.
  producers: BTreeMap<FlowPath, Vec<Endpoint>>,
  /// path -> endpoints reading from it, in declaration order.
  consumers: BTreeMap<FlowPath, Vec<Endpoint>>,
  /// Nodes with no inputs.
  entry_points: Vec<String>,
}

impl Graph {
  pub fn new(workflow: &Workflow) -> Self {
    let mut producers: BTreeMap<FlowPath, Vec<Endpoint>> = BTreeMap::new();
    let mut consumers: BTreeMap<FlowPath, Vec<Endpoint>> = BTreeMap::new();

    for (key, path) in &workflow.inflows {
      producers
        .entry(path.clone())
        .or_default()
        .push(Endpoint::external(key));
    }

    for node in &workflow.nodes {
      for input in &node.inputs {
        let consumer = Endpoint::node(&node.name);
        let entry = consumers.entry(input.path.clone()).or_default();
        // A node bound twice to one path still takes one value per firing.
        if !entry.contains(&consumer) {
          entry.push(consumer);
        }
      }
      for output in &node.outputs {
        let producer = Endpoint::node(&node.name);
        let entry = producers.entry(output.path.clone()).or_default();
        if !entry.contains(&producer) {
          entry.push(producer);
        }
      }
    }

    for (key, path) in &workflow.outflows {
      consumers
        .entry(path.clone())
        .or_default()
        .push(Endpoint::external(key));
    }

    let entry_points = workflow
      .nodes
      .iter()
      .filter(|node| node.inputs.is_empty())
      .map(|node| node.name.clone())
      .collect();

    Self {
      producers,
      consumers,
      entry_points,
    }
  }

  /// Endpoints writing to `path`.
  pub fn producers(&self, path: &FlowPath) -> &[Endpoint] {
    self.producers.get(path).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Endpoints reading from `path`.
  pub fn consumers(&self, path: &FlowPath) -> &[Endpoint] {
    self.consumers.get(path).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// The consumer table, used to seed a value store.
  pub fn subscriptions(&self) -> &BTreeMap<FlowPath, Vec<Endpoint>> {
    &self.consumers
  }

  /// Paths written by more than one endpoint.
  pub fn duplicate_producers(&self) -> impl Iterator<Item = (&FlowPath, &[Endpoint])> {
    self
      .producers
      .iter()
      .filter(|(_, producers)| producers.len() > 1)
      .map(|(path, producers)| (path, producers.as_slice()))
  }

  /// Every path that is produced or consumed at this level.
  pub fn paths(&self) -> BTreeSet<&FlowPath> {
    self.producers.keys().chain(self.consumers.keys()).collect()
  }

  /// Nodes that have no inputs.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Nodes consuming any output of `node_name`, without duplicates.
  pub fn downstream(&self, workflow: &Workflow, node_name: &str) -> Vec<String> {
    let mut downstream = Vec::new();
    let Some(node) = workflow.node(node_name) else {
      return downstream;
    };

    for output in &node.outputs {
      for consumer in self.consumers(&output.path) {
        if let Endpoint::Node(name) = consumer
          && !downstream.contains(name)
        {
          downstream.push(name.clone());
        }
      }
    }
    downstream
  }
}
