//! Node executor: readiness checks and single firings for one node.

use std::collections::BTreeMap;

use serde_json::Value;
use sluice_body::{Bindings, BodyRegistry};
use sluice_config::ValueType;
use sluice_store::ValueStore;
use sluice_workflow::{Endpoint, FlowPath, InputBinding, Node, NodeKind, Workflow};
use tracing::{debug, trace};

use crate::coerce::{check_output, coerce_input};
use crate::config::RuntimeConfig;
use crate::error::{NodeFault, RunError};
use crate::events::ExecutionNotifier;
use crate::scheduler::Scheduler;

/// Shared state of one run, handed down to nested workflow levels.
#[derive(Clone, Copy)]
pub(crate) struct RunContext<'a> {
  pub registry: &'a dyn BodyRegistry,
  pub config: &'a RuntimeConfig,
  pub notifier: &'a dyn ExecutionNotifier,
  pub run_id: &'a str,
}

/// Per-run firing state of one node.
pub(crate) struct NodeExecutor<'w> {
  node: &'w Node,
  endpoint: Endpoint,
  firings: u64,
  /// Inputs taken once and reused by later firings.
  latched: BTreeMap<String, Value>,
  /// Current values of the node's state variables.
  state: BTreeMap<String, Value>,
}

impl<'w> NodeExecutor<'w> {
  pub fn new(node: &'w Node) -> Self {
    Self {
      node,
      endpoint: Endpoint::node(&node.name),
      firings: 0,
      latched: BTreeMap::new(),
      state: node.state.clone(),
    }
  }

  pub fn node(&self) -> &'w Node {
    self.node
  }

  pub fn firings(&self) -> u64 {
    self.firings
  }

  fn below_limit(&self) -> bool {
    self.node.firing_limit.is_none_or(|limit| self.firings < limit)
  }

  /// Sequence nodes see the same upstream inputs on every element.
  fn latches(&self, input: &InputBinding) -> bool {
    input.receive_once || !self.node.sequences.is_empty()
  }

  fn available(&self, input: &InputBinding, store: &ValueStore) -> bool {
    self.latched.contains_key(&input.label) || self.fresh(input, store)
  }

  /// A value is waiting in the store and has not been latched.
  fn fresh(&self, input: &InputBinding, store: &ValueStore) -> bool {
    !self.latched.contains_key(&input.label) && store.peek_ready(&input.path, &self.endpoint)
  }

  /// Whether the inputs allow a firing.
  ///
  /// A node whose inputs are all optional fires first on defaults, then
  /// again only when some input delivers a fresh value.
  fn fed(&self, store: &ValueStore) -> bool {
    let mut required = self.node.required_inputs().peekable();
    if required.peek().is_some() {
      return required.all(|input| self.available(input, store));
    }

    self.node.inputs.is_empty()
      || self.firings == 0
      || self.node.inputs.iter().any(|input| self.fresh(input, store))
  }

  /// Whether the node may fire against the current store contents.
  pub fn can_fire(&self, store: &ValueStore) -> bool {
    self.below_limit()
      && self.fed(store)
      && !self
        .node
        .outputs
        .iter()
        .any(|output| store.holds_from(&output.path, &self.endpoint))
  }

  /// Required input paths still missing while some other input is already
  /// waiting.
  ///
  /// Empty unless the node is below its firing limit and partially fed.
  pub fn starved_inputs(&self, store: &ValueStore) -> Vec<&'w FlowPath> {
    if !self.below_limit() {
      return Vec::new();
    }

    let partially_fed = self.node.inputs.iter().any(|input| self.fresh(input, store));
    if !partially_fed {
      return Vec::new();
    }

    self
      .node
      .required_inputs()
      .filter(|input| !self.available(input, store))
      .map(|input| &input.path)
      .collect()
  }

  /// Fire once: take inputs, run the body, publish outputs.
  ///
  /// Returns the paths that were offered.
  pub fn fire(
    &mut self,
    store: &mut ValueStore,
    ctx: &RunContext<'_>,
  ) -> Result<Vec<&'w FlowPath>, RunError> {
    let node = self.node;
    let fault = |cause: NodeFault| RunError::NodeExecution {
      node: node.name.clone(),
      cause,
    };

    let mut bindings = Bindings::new();
    // One value per path per firing, even when bound to several labels.
    let mut taken: BTreeMap<&FlowPath, Value> = BTreeMap::new();
    for input in &node.inputs {
      let value = if let Some(value) = self.latched.get(&input.label) {
        value.clone()
      } else if input.optional
        && !taken.contains_key(&input.path)
        && !store.peek_ready(&input.path, &self.endpoint)
      {
        match &input.default {
          Some(value) => value.clone(),
          None => continue,
        }
      } else {
        let value = match taken.get(&input.path) {
          Some(value) => value.clone(),
          None => {
            let value = store.take(&input.path, &self.endpoint)?;
            taken.insert(&input.path, value.clone());
            value
          }
        };
        if self.latches(input) {
          self.latched.insert(input.label.clone(), value.clone());
        }
        value
      };

      let value = coerce_input(&input.label, value, node.declared_type(&input.label)).map_err(fault)?;
      bindings.insert(input.label.clone(), value);
    }

    let index = usize::try_from(self.firings).unwrap_or(usize::MAX);
    let locals = node
      .constants
      .clone()
      .into_iter()
      .chain(node.sequence_elements(index))
      .chain(self.state.clone());
    for (label, value) in locals {
      let value = coerce_input(&label, value, node.declared_type(&label)).map_err(fault)?;
      bindings.insert(label, value);
    }

    trace!(run_id = %ctx.run_id, node = %node.name, firing = self.firings + 1, "firing");

    let results = match &node.kind {
      NodeKind::Leaf { body } => {
        let body = ctx
          .registry
          .get(body)
          .ok_or_else(|| fault(NodeFault::UnknownBody(body.clone())))?;
        body.invoke(&bindings).map_err(|e| fault(NodeFault::Body(e)))?
      }
      NodeKind::Composite { workflow } => {
        run_composite(workflow, &bindings, ctx).map_err(|e| fault(NodeFault::Subworkflow(Box::new(e))))?
      }
    };

    let mut publish = Vec::with_capacity(node.outputs.len());
    for output in &node.outputs {
      let declared = node.declared_type(&output.label);
      match results.get(&output.label) {
        None | Some(Value::Null) if output.nullable => {
          debug!(node = %node.name, output = %output.label, "nullable output not produced");
        }
        None | Some(Value::Null) => {
          return Err(fault(NodeFault::MissingOutput {
            label: output.label.clone(),
          }));
        }
        Some(value) => {
          check_output(&output.label, value, declared).map_err(fault)?;
          let value_type = match declared {
            ValueType::Any => ValueType::of(value),
            declared => declared,
          };
          publish.push((&output.path, value.clone(), value_type));
        }
      }
    }

    let mut offered = Vec::with_capacity(publish.len());
    for (path, value, value_type) in publish {
      store.offer(path, value, value_type, self.endpoint.clone())?;
      offered.push(path);
    }

    for (label, current) in self.state.iter_mut() {
      if let Some(value) = results.get(label)
        && !value.is_null()
      {
        *current = value.clone();
      }
    }

    self.firings += 1;
    Ok(offered)
  }
}

/// Run a composite's nested workflow to quiescence in a private store.
fn run_composite(
  workflow: &Workflow,
  inputs: &Bindings,
  ctx: &RunContext<'_>,
) -> Result<Bindings, RunError> {
  let graph = workflow.graph();
  let mut store = ValueStore::new(graph.subscriptions().clone());

  for (key, path) in &workflow.inflows {
    if let Some(value) = inputs.get(key) {
      store.offer(path, value.clone(), ValueType::of(value), Endpoint::external(key))?;
    }
  }

  Scheduler::new(workflow, *ctx).run(&mut store)?;

  let mut outputs = Bindings::new();
  for (key, path) in &workflow.outflows {
    let consumer = Endpoint::external(key);
    if store.peek_ready(path, &consumer) {
      outputs.insert(key.clone(), store.take(path, &consumer)?);
    }
  }
  Ok(outputs)
}
