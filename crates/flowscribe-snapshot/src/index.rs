//! Latest-snapshot index.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the most recent snapshot of a workflow lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub wf_item: String,
    /// Document path relative to the store root.
    pub path: String,
    pub hash: String,
    pub version: u32,
    pub session_id: String,
    pub captured_at: DateTime<Utc>,
}

/// Index key of a workflow: `{workflow_id}_{wf_item}`, or the bare
/// `workflow_id` when the source identifier is empty.
///
/// Two editor names can sanitize to the same `workflow_id`; the source
/// identifier keeps their histories apart.
pub fn index_key(workflow_id: &str, wf_item: &str) -> String {
    if wf_item.is_empty() {
        workflow_id.to_string()
    } else {
        format!("{workflow_id}_{wf_item}")
    }
}

/// Workflow identity to its latest snapshot, across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    #[serde(default)]
    pub workflows: BTreeMap<String, IndexEntry>,
}

impl SnapshotIndex {
    pub fn get(&self, workflow_id: &str, wf_item: &str) -> Option<&IndexEntry> {
        self.workflows.get(&index_key(workflow_id, wf_item))
    }

    /// Record `entry` as the latest snapshot of `workflow_id`.
    pub fn insert(&mut self, workflow_id: &str, entry: IndexEntry) {
        let key = index_key(workflow_id, &entry.wf_item);
        self.workflows.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}
