//! Session summary records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Every located step was inspected.
    Complete,
    /// Saved, but some steps have no properties because inspection failed.
    Partial,
}

/// A saved workflow, as listed in the session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummaryEntry {
    pub name: String,
    pub wf_item: String,
    pub steps_count: usize,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incomplete_steps: Vec<u32>,
}

/// A workflow that was skipped or failed, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowIssue {
    pub name: String,
    pub wf_item: Option<String>,
    pub reason: String,
}

/// Summary of one extraction run. Written once, at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub extraction_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Workflows found in the navigation list.
    pub total_workflows: usize,
    pub workflows: Vec<WorkflowSummaryEntry>,
    #[serde(default)]
    pub skipped: Vec<WorkflowIssue>,
    #[serde(default)]
    pub failed: Vec<WorkflowIssue>,
    /// Reason the session stopped early, if it did.
    #[serde(default)]
    pub aborted: Option<String>,
}

impl SessionSummary {
    pub fn new(session_id: impl Into<String>, extraction_date: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            extraction_date,
            completed_at: None,
            total_workflows: 0,
            workflows: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            aborted: None,
        }
    }

    /// Saved entry for a source identifier.
    pub fn entry(&self, wf_item: &str) -> Option<&WorkflowSummaryEntry> {
        self.workflows.iter().find(|w| w.wf_item == wf_item)
    }

    pub fn partial_count(&self) -> usize {
        self.workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Partial)
            .count()
    }
}
