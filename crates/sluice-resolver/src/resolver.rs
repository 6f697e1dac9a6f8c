use std::collections::{BTreeMap, HashSet};

use sluice_body::BodyRegistry;
use sluice_config::{FiringPolicy, NodeDef, NodeType as ConfigNodeType, WorkflowDef};
use sluice_workflow::{
  ConfigurationError, InputBinding, Namespace, Node, NodeKind, OutputBinding, Workflow,
};
use tracing::debug;

use crate::options::ResolverOptions;

/// Resolver transforms a WorkflowDef into a compiled Workflow.
pub trait Resolver: Send + Sync {
  /// Resolve a workflow definition into a compiled workflow.
  ///
  /// This process:
  /// 1. Names anonymous nodes and rejects duplicate names
  /// 2. Binds every node-local name to an absolute flow path
  /// 3. Checks every body name against the registry
  /// 4. Validates that every consumed path has a producer
  fn resolve(&self, def: &WorkflowDef) -> Result<Workflow, ConfigurationError>;
}

/// Standard resolver implementation that checks bodies against a registry.
pub struct StandardResolver<R: BodyRegistry> {
  registry: R,
  options: ResolverOptions,
}

/// Raw boundary of one workflow level: key -> declared path.
type Boundary<'a> = BTreeMap<String, &'a str>;

impl<R: BodyRegistry> StandardResolver<R> {
  /// Create a new resolver with the given body registry.
  pub fn new(registry: R) -> Self {
    Self::with_options(registry, ResolverOptions::default())
  }

  pub fn with_options(registry: R, options: ResolverOptions) -> Self {
    Self { registry, options }
  }

  /// Resolve one workflow level. `nested` levels are composite bodies whose
  /// inflows must all be consumed.
  fn resolve_level(
    &self,
    name: &str,
    namespace: Namespace,
    nodes: &[NodeDef],
    inflows: &Boundary<'_>,
    outflows: &Boundary<'_>,
    nested: bool,
  ) -> Result<Workflow, ConfigurationError> {
    if name.is_empty() {
      return Err(ConfigurationError::EmptyName {
        what: "workflow".to_string(),
      });
    }

    let mut names = HashSet::new();
    let mut resolved_nodes = Vec::with_capacity(nodes.len());
    for (index, node_def) in nodes.iter().enumerate() {
      let node_name = if node_def.name.is_empty() {
        format!("node_{}", index + 1)
      } else {
        node_def.name.clone()
      };

      if !names.insert(node_name.clone()) {
        return Err(ConfigurationError::DuplicateNode {
          workflow: name.to_string(),
          node: node_name,
        });
      }

      resolved_nodes.push(self.resolve_node(name, &namespace, node_name, node_def)?);
    }

    let resolve_boundary = |boundary: &Boundary<'_>| {
      boundary
        .iter()
        .map(|(key, raw)| Ok((key.clone(), namespace.resolve_external(raw)?)))
        .collect::<Result<BTreeMap<_, _>, ConfigurationError>>()
    };

    let workflow = Workflow {
      name: name.to_string(),
      inflows: resolve_boundary(inflows)?,
      outflows: resolve_boundary(outflows)?,
      namespace,
      nodes: resolved_nodes,
    };

    self.validate_flows(&workflow, nested)?;
    Ok(workflow)
  }

  /// Resolve a single node definition into a compiled node.
  fn resolve_node(
    &self,
    workflow_name: &str,
    namespace: &Namespace,
    node_name: String,
    node_def: &NodeDef,
  ) -> Result<Node, ConfigurationError> {
    self.validate_bindings(&node_name, node_def)?;

    let inputs = node_def
      .inflows
      .iter()
      .map(|(label, inflow)| {
        Ok(InputBinding {
          label: label.clone(),
          path: namespace.resolve(&node_name, inflow.path())?,
          receive_once: inflow.receive_once(),
          optional: inflow.is_optional(),
          default: inflow.default_value().cloned(),
        })
      })
      .collect::<Result<Vec<_>, ConfigurationError>>()?;

    let outputs = node_def
      .outflows
      .iter()
      .map(|(label, outflow)| {
        Ok(OutputBinding {
          label: label.clone(),
          path: namespace.resolve(&node_name, outflow.path())?,
          nullable: outflow.nullable(),
        })
      })
      .collect::<Result<Vec<_>, ConfigurationError>>()?;

    let kind = match &node_def.node_type {
      ConfigNodeType::Leaf { body } => {
        if self.registry.get(body).is_none() {
          return Err(ConfigurationError::UnknownBody {
            node: node_name,
            body: body.clone(),
          });
        }
        NodeKind::Leaf { body: body.clone() }
      }
      ConfigNodeType::Composite { nodes } => {
        // Composite binding keys name the nested workflow's boundary.
        let child_inflows: Boundary<'_> = node_def
          .inflows
          .keys()
          .map(|key| (key.clone(), key.as_str()))
          .collect();
        let child_outflows: Boundary<'_> = node_def
          .outflows
          .keys()
          .map(|key| (key.clone(), key.as_str()))
          .collect();

        let nested = self.resolve_level(
          &node_name,
          namespace.nested(workflow_name, &node_name),
          nodes,
          &child_inflows,
          &child_outflows,
          true,
        )?;
        NodeKind::Composite {
          workflow: Box::new(nested),
        }
      }
    };

    let sequence_len = node_def.sequences.values().next().map(|s| s.len() as u64);
    let firing_limit = match (node_def.firing, sequence_len) {
      (FiringPolicy::Once, Some(len)) => Some(len.min(1)),
      (FiringPolicy::Repeatable, Some(len)) => Some(len),
      (FiringPolicy::Once, None) => Some(1),
      (FiringPolicy::Repeatable, None) if inputs.is_empty() => Some(1),
      (FiringPolicy::Repeatable, None) => None,
    };

    Ok(Node {
      name: node_name,
      kind,
      inputs,
      outputs,
      types: node_def.types.clone(),
      constants: node_def.constants.clone(),
      sequences: node_def.sequences.clone(),
      state: node_def.state.clone(),
      firing_limit,
    })
  }

  /// Check that constants, sequences, state and inflows bind distinct labels
  /// and that all sequences have the same length.
  fn validate_bindings(&self, node_name: &str, node_def: &NodeDef) -> Result<(), ConfigurationError> {
    let conflict = |label: &String| ConfigurationError::BindingConflict {
      node: node_name.to_string(),
      label: label.clone(),
    };

    for label in node_def.constants.keys() {
      if node_def.inflows.contains_key(label) || node_def.sequences.contains_key(label) {
        return Err(conflict(label));
      }
    }
    for label in node_def.sequences.keys() {
      if node_def.inflows.contains_key(label) {
        return Err(conflict(label));
      }
    }
    for label in node_def.state.keys() {
      if node_def.inflows.contains_key(label)
        || node_def.constants.contains_key(label)
        || node_def.sequences.contains_key(label)
      {
        return Err(conflict(label));
      }
    }

    let mut lengths = node_def.sequences.iter();
    if let Some((_, first)) = lengths.next() {
      for (label, values) in lengths {
        if values.len() != first.len() {
          return Err(ConfigurationError::SequenceLength {
            node: node_name.to_string(),
            label: label.clone(),
            expected: first.len(),
            actual: values.len(),
          });
        }
      }
    }

    Ok(())
  }

  /// Validate producer/consumer pairing at one workflow level.
  fn validate_flows(&self, workflow: &Workflow, nested: bool) -> Result<(), ConfigurationError> {
    let graph = workflow.graph();

    for node in &workflow.nodes {
      // Optional inputs may be left unwired.
      for input in node.required_inputs() {
        if graph.producers(&input.path).is_empty() {
          return Err(ConfigurationError::UnresolvedInflow {
            workflow: workflow.name.clone(),
            node: node.name.clone(),
            label: input.label.clone(),
            path: input.path.to_string(),
          });
        }
      }
    }

    for (key, path) in &workflow.outflows {
      if graph.producers(path).is_empty() {
        return Err(ConfigurationError::UnresolvedOutflow {
          workflow: workflow.name.clone(),
          key: key.clone(),
          path: path.to_string(),
        });
      }
    }

    if nested {
      for (key, path) in &workflow.inflows {
        if graph.consumers(path).is_empty() {
          return Err(ConfigurationError::UnconsumedInflow {
            workflow: workflow.name.clone(),
            key: key.clone(),
            path: path.to_string(),
          });
        }
      }
    }

    if self.options.strict_producers
      && let Some((path, producers)) = graph.duplicate_producers().next()
    {
      return Err(ConfigurationError::DuplicateProducer {
        workflow: workflow.name.clone(),
        path: path.to_string(),
        producers: producers.iter().map(ToString::to_string).collect(),
      });
    }

    Ok(())
  }
}

impl<R: BodyRegistry> Resolver for StandardResolver<R> {
  fn resolve(&self, def: &WorkflowDef) -> Result<Workflow, ConfigurationError> {
    let inflows: Boundary<'_> = def
      .inflows
      .iter()
      .map(|(key, path)| (key.clone(), path.as_str()))
      .collect();
    let outflows: Boundary<'_> = def
      .outflows
      .iter()
      .map(|(key, path)| (key.clone(), path.as_str()))
      .collect();

    let workflow = self.resolve_level(
      &def.name,
      Namespace::top(),
      &def.nodes,
      &inflows,
      &outflows,
      false,
    )?;

    debug!(
      workflow = %workflow.name,
      nodes = workflow.nodes.len(),
      "workflow resolved"
    );
    Ok(workflow)
  }
}
