use std::collections::BTreeMap;

use serde_json::Value;
use sluice_config::ValueType;
use sluice_workflow::{Endpoint, FlowPath};
use tracing::{debug, trace};

use crate::StoreError;
use crate::types::PendingValue;

#[derive(Debug, Clone)]
struct Entry {
  value: Value,
  value_type: ValueType,
  producer: Endpoint,
  pending: Vec<Endpoint>,
}

impl Entry {
  fn awaited_by_node(&self) -> bool {
    self.pending.iter().any(|c| matches!(c, Endpoint::Node(_)))
  }
}

/// In-memory store of values in flight between endpoints.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
  /// path -> designated consumers, fixed at configure time.
  subscriptions: BTreeMap<FlowPath, Vec<Endpoint>>,
  entries: BTreeMap<FlowPath, Entry>,
}

impl ValueStore {
  pub fn new(subscriptions: BTreeMap<FlowPath, Vec<Endpoint>>) -> Self {
    Self {
      subscriptions,
      entries: BTreeMap::new(),
    }
  }

  /// Publish `value` at `path` on behalf of `producer`.
  ///
  /// Fails if the path still holds a value awaited by a node. A value only
  /// external consumers are still waiting for is replaced, so external
  /// outflows keep the latest value. A value offered to a path nobody
  /// subscribes to is dropped.
  pub fn offer(
    &mut self,
    path: &FlowPath,
    value: Value,
    value_type: ValueType,
    producer: Endpoint,
  ) -> Result<(), StoreError> {
    if let Some(existing) = self.entries.get(path) {
      if existing.awaited_by_node() {
        return Err(StoreError::DuplicateWrite {
          path: path.clone(),
          producer,
          holder: existing.producer.clone(),
        });
      }
      debug!(path = %path, producer = %producer, "superseding uncollected value");
    }

    let consumers = self.subscriptions.get(path).cloned().unwrap_or_default();
    if consumers.is_empty() {
      debug!(path = %path, producer = %producer, "discarding value with no consumers");
      return Ok(());
    }

    trace!(path = %path, producer = %producer, consumers = consumers.len(), "value offered");
    self.entries.insert(
      path.clone(),
      Entry {
        value,
        value_type,
        producer,
        pending: consumers,
      },
    );
    Ok(())
  }

  /// Take the value at `path` for `consumer`.
  ///
  /// The entry is removed once its last designated consumer has taken it.
  pub fn take(&mut self, path: &FlowPath, consumer: &Endpoint) -> Result<Value, StoreError> {
    let not_ready = || StoreError::NotReady {
      path: path.clone(),
      consumer: consumer.clone(),
    };

    let entry = self.entries.get_mut(path).ok_or_else(not_ready)?;
    let position = entry
      .pending
      .iter()
      .position(|c| c == consumer)
      .ok_or_else(not_ready)?;
    entry.pending.remove(position);

    if entry.pending.is_empty() {
      let entry = self.entries.remove(path).ok_or_else(not_ready)?;
      Ok(entry.value)
    } else {
      Ok(entry.value.clone())
    }
  }

  /// Whether a value at `path` is waiting for `consumer`.
  pub fn peek_ready(&self, path: &FlowPath, consumer: &Endpoint) -> bool {
    self
      .entries
      .get(path)
      .is_some_and(|entry| entry.pending.contains(consumer))
  }

  /// Whether `path` still holds a value offered by `producer` that some node
  /// has yet to take.
  pub fn holds_from(&self, path: &FlowPath, producer: &Endpoint) -> bool {
    self
      .entries
      .get(path)
      .is_some_and(|entry| &entry.producer == producer && entry.awaited_by_node())
  }

  /// Number of paths holding an undelivered value.
  pub fn size(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Snapshot of every undelivered value.
  pub fn pending(&self) -> Vec<PendingValue> {
    self
      .entries
      .iter()
      .map(|(path, entry)| PendingValue {
        path: path.clone(),
        value: entry.value.clone(),
        value_type: entry.value_type,
        producer: entry.producer.clone(),
        consumers: entry.pending.clone(),
      })
      .collect()
  }

  /// Drop every undelivered value. Subscriptions are kept.
  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
