//! Step-level drift between two snapshots of a workflow.

use std::collections::BTreeMap;

use flowscribe_protocols::WorkflowRecord;
use serde::{Deserialize, Serialize};

/// Step orders that differ between two snapshots, each list ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Orders present only in the new snapshot.
    pub added: Vec<u32>,
    /// Orders present only in the old snapshot.
    pub removed: Vec<u32>,
    /// Orders present in both with different step hashes.
    pub modified: Vec<u32>,
    pub hash_changed: bool,
}

impl ChangeSet {
    /// No step changed. The record hash may still differ through
    /// workflow-level metadata; see `hash_changed`.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Diff two snapshots by matching steps on `order`.
pub fn compare(old: &WorkflowRecord, new: &WorkflowRecord) -> ChangeSet {
    let old_steps: BTreeMap<u32, &str> = old
        .steps
        .iter()
        .map(|s| (s.order, s.step_hash.as_str()))
        .collect();
    let new_steps: BTreeMap<u32, &str> = new
        .steps
        .iter()
        .map(|s| (s.order, s.step_hash.as_str()))
        .collect();

    let mut changes = ChangeSet {
        hash_changed: old.hash != new.hash,
        ..Default::default()
    };

    for (order, hash) in &new_steps {
        match old_steps.get(order) {
            None => changes.added.push(*order),
            Some(old_hash) if old_hash != hash => changes.modified.push(*order),
            Some(_) => {}
        }
    }
    changes.removed = old_steps
        .keys()
        .filter(|order| !new_steps.contains_key(*order))
        .copied()
        .collect();

    changes
}
