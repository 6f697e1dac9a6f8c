//! Firing scheduler.
//!
//! Repeatedly passes over the nodes of one workflow level in declaration
//! order, firing each node that is ready, until a pass fires nothing.

use sluice_store::{PendingValue, ValueStore};
use sluice_workflow::{Endpoint, Workflow};
use tracing::{debug, warn};

use crate::error::RunError;
use crate::events::ExecutionEvent;
use crate::executor::{NodeExecutor, RunContext};

pub(crate) struct Scheduler<'a> {
  workflow: &'a Workflow,
  ctx: RunContext<'a>,
}

impl<'a> Scheduler<'a> {
  pub fn new(workflow: &'a Workflow, ctx: RunContext<'a>) -> Self {
    Self { workflow, ctx }
  }

  /// Run to quiescence and return the number of firings.
  pub fn run(&self, store: &mut ValueStore) -> Result<u64, RunError> {
    let mut executors: Vec<NodeExecutor<'a>> = self.workflow.nodes.iter().map(NodeExecutor::new).collect();
    let mut firings = 0u64;
    let mut passes = 0u64;

    loop {
      passes += 1;
      let mut fired = 0usize;

      for executor in executors.iter_mut() {
        if !executor.can_fire(store) {
          continue;
        }

        if let Some(limit) = self.ctx.config.max_firings
          && firings >= limit
        {
          return Err(RunError::FiringLimit {
            workflow: self.workflow.name.clone(),
            limit,
          });
        }

        let offered = executor.fire(store, &self.ctx)?;
        firings += 1;
        fired += 1;

        self.ctx.notifier.notify(ExecutionEvent::NodeFired {
          run_id: self.ctx.run_id.to_string(),
          workflow: self.workflow.name.clone(),
          node: executor.node().name.clone(),
          firing: executor.firings(),
        });
        for path in offered {
          self.ctx.notifier.notify(ExecutionEvent::ValueOffered {
            run_id: self.ctx.run_id.to_string(),
            path: path.to_string(),
            producer: executor.node().name.clone(),
          });
        }
      }

      if fired == 0 {
        break;
      }
    }

    debug!(
      run_id = %self.ctx.run_id,
      workflow = %self.workflow.name,
      firings,
      passes,
      "quiescent"
    );

    self.check_deadlock(&executors, store)?;

    if self.ctx.config.report_unused_data {
      // Values awaiting an external consumer are the caller's to collect.
      let unused: Vec<PendingValue> = store
        .pending()
        .into_iter()
        .filter(|pending| pending.consumers.iter().any(|c| matches!(c, Endpoint::Node(_))))
        .collect();
      report_unused(self.ctx, &self.workflow.name, &unused);
    }

    Ok(firings)
  }

  /// Fail if an external outflow was never produced.
  ///
  /// Inputs of starved nodes are listed alongside the missing outflows. A
  /// starved node alone does not fail the run; its leftovers are unused data.
  fn check_deadlock(&self, executors: &[NodeExecutor<'_>], store: &ValueStore) -> Result<(), RunError> {
    let mut unmet: Vec<String> = self
      .workflow
      .outflows
      .iter()
      .filter(|(key, path)| !store.peek_ready(path, &Endpoint::external(key.as_str())))
      .map(|(_, path)| path.to_string())
      .collect();

    if unmet.is_empty() {
      return Ok(());
    }

    for executor in executors {
      unmet.extend(executor.starved_inputs(store).into_iter().map(ToString::to_string));
    }

    unmet.sort();
    unmet.dedup();
    warn!(
      run_id = %self.ctx.run_id,
      workflow = %self.workflow.name,
      unmet = ?unmet,
      "deadlock"
    );
    Err(RunError::Deadlock {
      workflow: self.workflow.name.clone(),
      unmet,
    })
  }
}

/// Log and emit an event for each value left undelivered.
pub(crate) fn report_unused(ctx: RunContext<'_>, workflow: &str, unused: &[PendingValue]) {
  for pending in unused {
    let consumers: Vec<String> = pending.consumers.iter().map(ToString::to_string).collect();
    warn!(
      run_id = %ctx.run_id,
      workflow = %workflow,
      path = %pending.path,
      value = %pending.value,
      consumers = ?consumers,
      "unused_data"
    );
    ctx.notifier.notify(ExecutionEvent::UnusedData {
      run_id: ctx.run_id.to_string(),
      path: pending.path.to_string(),
      value: pending.value.clone(),
      consumers,
    });
  }
}
