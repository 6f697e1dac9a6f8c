//! Workflow instances and their lifecycle.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sluice_body::BodyRegistry;
use sluice_config::ValueType;
use sluice_store::{StoreError, ValueStore};
use sluice_workflow::{Endpoint, FlowPath, Workflow};
use tracing::{error, info, instrument};

use crate::config::RuntimeConfig;
use crate::error::RunError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::executor::RunContext;
use crate::scheduler::{Scheduler, report_unused};

/// Lifecycle state of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
  Unconfigured,
  Configured,
  Initialized,
  Ran,
  WrappedUp,
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      LifecycleState::Unconfigured => "unconfigured",
      LifecycleState::Configured => "configured",
      LifecycleState::Initialized => "initialized",
      LifecycleState::Ran => "ran",
      LifecycleState::WrappedUp => "wrapped up",
    };
    f.write_str(s)
  }
}

/// A compiled workflow bound to its own value store.
///
/// Instances created from the same compiled workflow are independent and may
/// run on different threads.
pub struct WorkflowInstance {
  workflow: Arc<Workflow>,
  registry: Arc<dyn BodyRegistry>,
  config: RuntimeConfig,
  notifier: Arc<dyn ExecutionNotifier>,
  subscriptions: BTreeMap<FlowPath, Vec<Endpoint>>,
  state: LifecycleState,
  store: ValueStore,
  /// Inputs set for the next run, keyed by inflow with their resolved path.
  staged: BTreeMap<String, (FlowPath, Value)>,
  run_id: Option<String>,
}

impl WorkflowInstance {
  pub(crate) fn new(
    workflow: Arc<Workflow>,
    registry: Arc<dyn BodyRegistry>,
    config: RuntimeConfig,
    notifier: Arc<dyn ExecutionNotifier>,
  ) -> Self {
    let subscriptions = workflow.graph().subscriptions().clone();
    Self {
      workflow,
      registry,
      config,
      notifier,
      subscriptions,
      state: LifecycleState::Configured,
      store: ValueStore::default(),
      staged: BTreeMap::new(),
      run_id: None,
    }
  }

  pub fn workflow(&self) -> &Arc<Workflow> {
    &self.workflow
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  /// Id of the most recent run, if any.
  pub fn run_id(&self) -> Option<&str> {
    self.run_id.as_deref()
  }

  /// Number of undelivered values in the store.
  pub fn store_size(&self) -> usize {
    self.store.size()
  }

  fn expect_state(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<(), RunError> {
    if allowed.contains(&self.state) {
      Ok(())
    } else {
      Err(RunError::Protocol {
        operation,
        state: self.state,
      })
    }
  }

  /// Reset to a fresh store with no staged inputs. Callable repeatedly.
  pub fn initialize(&mut self) -> Result<(), RunError> {
    use LifecycleState::*;
    self.expect_state("initialize", &[Configured, Initialized, Ran, WrappedUp])?;

    self.store = ValueStore::new(self.subscriptions.clone());
    self.staged.clear();
    self.run_id = None;
    self.state = Initialized;
    Ok(())
  }

  /// Stage a value for an external inflow.
  pub fn set(&mut self, key: &str, value: Value) -> Result<(), RunError> {
    self.expect_state("set", &[LifecycleState::Initialized])?;

    let path = self
      .workflow
      .inflow(key)
      .ok_or_else(|| RunError::UnknownInflow(key.to_string()))?;

    if self.staged.contains_key(key) {
      return Err(
        StoreError::DuplicateWrite {
          path: path.clone(),
          producer: Endpoint::external(key),
          holder: Endpoint::external(key),
        }
        .into(),
      );
    }

    self.staged.insert(key.to_string(), (path.clone(), value));
    Ok(())
  }

  /// Publish staged inputs and run to quiescence.
  ///
  /// On failure the store is dropped and the instance returns to the
  /// configured state.
  #[instrument(
    name = "workflow_run",
    skip(self),
    fields(workflow = %self.workflow.name)
  )]
  pub fn run(&mut self) -> Result<(), RunError> {
    self.expect_state("run", &[LifecycleState::Initialized])?;

    let run_id = uuid::Uuid::new_v4().to_string();
    self.run_id = Some(run_id.clone());

    info!(
      run_id = %run_id,
      workflow = %self.workflow.name,
      inputs = self.staged.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      run_id: run_id.clone(),
      workflow: self.workflow.name.clone(),
    });

    match self.execute(&run_id) {
      Ok(firings) => {
        info!(run_id = %run_id, firings, store_size = self.store.size(), "workflow_completed");
        self.notifier.notify(ExecutionEvent::RunCompleted { run_id, firings });
        self.state = LifecycleState::Ran;
        Ok(())
      }
      Err(e) => {
        error!(run_id = %run_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::RunFailed {
          run_id,
          error: e.to_string(),
        });
        self.store.clear();
        self.staged.clear();
        self.state = LifecycleState::Configured;
        Err(e)
      }
    }
  }

  fn execute(&mut self, run_id: &str) -> Result<u64, RunError> {
    for (key, (path, value)) in std::mem::take(&mut self.staged) {
      let value_type = ValueType::of(&value);
      self.store.offer(&path, value, value_type, Endpoint::external(key))?;
    }

    let ctx = RunContext {
      registry: self.registry.as_ref(),
      config: &self.config,
      notifier: self.notifier.as_ref(),
      run_id,
    };
    Scheduler::new(&self.workflow, ctx).run(&mut self.store)
  }

  /// Take the value of an external outflow. Each value can be taken once.
  pub fn get(&mut self, key: &str) -> Result<Value, RunError> {
    self.expect_state("get", &[LifecycleState::Ran])?;

    let path = self
      .workflow
      .outflow(key)
      .ok_or_else(|| RunError::UnknownOutflow(key.to_string()))?;
    Ok(self.store.take(path, &Endpoint::external(key))?)
  }

  /// Take every external outflow value that is still available.
  pub fn outputs(&mut self) -> Result<BTreeMap<String, Value>, RunError> {
    self.expect_state("outputs", &[LifecycleState::Ran])?;

    let mut outputs = BTreeMap::new();
    for (key, path) in &self.workflow.outflows {
      let consumer = Endpoint::external(key);
      if self.store.peek_ready(path, &consumer) {
        outputs.insert(key.clone(), self.store.take(path, &consumer)?);
      }
    }
    Ok(outputs)
  }

  /// Release the store, reporting anything left in it.
  pub fn wrapup(&mut self) -> Result<(), RunError> {
    use LifecycleState::*;
    self.expect_state("wrapup", &[Configured, Initialized, Ran])?;

    if self.config.report_unused_data {
      let run_id = self.run_id.clone().unwrap_or_default();
      let ctx = RunContext {
        registry: self.registry.as_ref(),
        config: &self.config,
        notifier: self.notifier.as_ref(),
        run_id: &run_id,
      };
      // Node-bound leftovers were already reported at quiescence.
      let unused: Vec<_> = self
        .store
        .pending()
        .into_iter()
        .filter(|pending| pending.consumers.iter().all(|c| matches!(c, Endpoint::External(_))))
        .collect();
      report_unused(ctx, &self.workflow.name, &unused);
    }

    self.store.clear();
    self.staged.clear();
    self.state = WrappedUp;
    Ok(())
  }
}

impl fmt::Debug for WorkflowInstance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkflowInstance")
      .field("workflow", &self.workflow.name)
      .field("state", &self.state)
      .field("store_size", &self.store.size())
      .field("run_id", &self.run_id)
      .finish()
  }
}
