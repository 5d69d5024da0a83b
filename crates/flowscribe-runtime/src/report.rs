//! What a session run produced.

use std::path::PathBuf;

use flowscribe_protocols::SessionSummary;
use flowscribe_snapshot::ChangeSet;
use serde::Serialize;

/// One saved workflow and how it moved relative to its prior snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedWorkflow {
    pub workflow_id: String,
    pub name: String,
    pub path: PathBuf,
    pub version: u32,
    /// `None` when this is the first snapshot of the workflow.
    pub changes: Option<ChangeSet>,
}

impl SavedWorkflow {
    /// New workflow, or content differs from the prior snapshot.
    pub fn is_new_or_changed(&self) -> bool {
        self.changes.as_ref().is_none_or(|c| c.hash_changed)
    }
}

/// Result of [`Orchestrator::run`](crate::Orchestrator::run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub summary: SessionSummary,
    /// Where the summary was written; `None` if that write failed.
    pub summary_path: Option<PathBuf>,
    pub saved: Vec<SavedWorkflow>,
}

impl SessionReport {
    pub fn was_aborted(&self) -> bool {
        self.summary.aborted.is_some()
    }

    pub fn changed(&self) -> impl Iterator<Item = &SavedWorkflow> {
        self.saved.iter().filter(|w| w.is_new_or_changed())
    }
}
