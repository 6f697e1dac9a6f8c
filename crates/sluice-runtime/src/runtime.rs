//! Workflow runtime.
//!
//! The [`Runtime`] struct is the main entry point for executing workflows.
//! It owns a workflow definition and a body registry, compiles the definition
//! on [`configure`](Runtime::configure), and drives a default
//! [`WorkflowInstance`] through the caller operations. Additional independent
//! instances are available through [`instance`](Runtime::instance).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use sluice_body::BodyRegistry;
use sluice_config::WorkflowDef;
use sluice_resolver::{Resolver, ResolverOptions, StandardResolver};
use sluice_workflow::Workflow;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::RunError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::instance::{LifecycleState, WorkflowInstance};

/// The workflow runtime.
pub struct Runtime {
  definition: WorkflowDef,
  registry: Arc<dyn BodyRegistry>,
  config: RuntimeConfig,
  options: ResolverOptions,
  notifier: Arc<dyn ExecutionNotifier>,
  instance: Option<WorkflowInstance>,
}

impl Runtime {
  /// Create a new, unconfigured runtime for the given definition.
  pub fn new(definition: WorkflowDef, registry: Arc<dyn BodyRegistry>, config: RuntimeConfig) -> Self {
    Self {
      definition,
      registry,
      config,
      options: ResolverOptions::default(),
      notifier: Arc::new(NoopNotifier),
      instance: None,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn with_resolver_options(mut self, options: ResolverOptions) -> Self {
    self.options = options;
    self
  }

  pub fn definition(&self) -> &WorkflowDef {
    &self.definition
  }

  /// The compiled workflow, once configured.
  pub fn workflow(&self) -> Option<&Arc<Workflow>> {
    self.instance.as_ref().map(WorkflowInstance::workflow)
  }

  pub fn state(&self) -> LifecycleState {
    self
      .instance
      .as_ref()
      .map_or(LifecycleState::Unconfigured, WorkflowInstance::state)
  }

  /// Resolve and validate the definition.
  ///
  /// Configuring an already configured runtime returns the existing compiled
  /// workflow without touching the current instance.
  pub fn configure(&mut self) -> Result<Arc<Workflow>, RunError> {
    if let Some(instance) = &self.instance {
      debug!(workflow = %self.definition.name, "already configured");
      return Ok(instance.workflow().clone());
    }

    let resolver = StandardResolver::with_options(self.registry.clone(), self.options);
    let workflow = Arc::new(resolver.resolve(&self.definition)?);

    info!(
      workflow = %workflow.name,
      nodes = workflow.nodes.len(),
      inflows = workflow.inflows.len(),
      outflows = workflow.outflows.len(),
      "workflow_configured"
    );

    self.instance = Some(self.new_instance(workflow.clone()));
    Ok(workflow)
  }

  /// Create an independent instance sharing the compiled workflow.
  pub fn instance(&self) -> Result<WorkflowInstance, RunError> {
    let workflow = self.workflow().cloned().ok_or(RunError::Protocol {
      operation: "create instance",
      state: LifecycleState::Unconfigured,
    })?;
    Ok(self.new_instance(workflow))
  }

  fn new_instance(&self, workflow: Arc<Workflow>) -> WorkflowInstance {
    WorkflowInstance::new(
      workflow,
      self.registry.clone(),
      self.config.clone(),
      self.notifier.clone(),
    )
  }

  fn current(&mut self, operation: &'static str) -> Result<&mut WorkflowInstance, RunError> {
    self.instance.as_mut().ok_or(RunError::Protocol {
      operation,
      state: LifecycleState::Unconfigured,
    })
  }

  pub fn initialize(&mut self) -> Result<(), RunError> {
    self.current("initialize")?.initialize()
  }

  pub fn set(&mut self, key: &str, value: Value) -> Result<(), RunError> {
    self.current("set")?.set(key, value)
  }

  pub fn run(&mut self) -> Result<(), RunError> {
    self.current("run")?.run()
  }

  pub fn get(&mut self, key: &str) -> Result<Value, RunError> {
    self.current("get")?.get(key)
  }

  pub fn outputs(&mut self) -> Result<BTreeMap<String, Value>, RunError> {
    self.current("outputs")?.outputs()
  }

  pub fn wrapup(&mut self) -> Result<(), RunError> {
    self.current("wrapup")?.wrapup()
  }

  pub fn store_size(&self) -> usize {
    self.instance.as_ref().map_or(0, WorkflowInstance::store_size)
  }
}
