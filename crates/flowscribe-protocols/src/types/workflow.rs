//! Workflow snapshot records.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::step::{ParameterDescriptor, StepRecord};

/// How a workflow is started, detected from page-level text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    ApiWorkflow,
    ScheduledApi,
    CustomEvent,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiWorkflow => "api_workflow",
            Self::ScheduledApi => "scheduled_api",
            Self::CustomEvent => "custom_event",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    #[serde(rename = "type")]
    pub trigger_type: Option<TriggerType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub trigger: TriggerInfo,
    /// Workflow-level panel, read right after selection.
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInterface {
    #[serde(default)]
    pub inputs: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// A fully assembled workflow snapshot.
///
/// Records are never edited once assembled: a re-extraction produces a new
/// record that is compared to the old one by hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow_id: String,
    /// Identifier of the workflow in the source editor.
    pub wf_item: String,
    pub name: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub version: u32,
    #[serde(default)]
    pub metadata: WorkflowMetadata,
    #[serde(default)]
    pub interface: WorkflowInterface,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub hash: String,
}

impl WorkflowRecord {
    /// Step with the given order, if present.
    pub fn step(&self, order: u32) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.order == order)
    }

    /// Consume a freshly assembled record and give it the version that
    /// follows `prior`: unchanged content keeps the prior version, changed
    /// content bumps it.
    pub fn versioned_after(self, prior: Option<&WorkflowRecord>) -> Self {
        let version = match prior {
            Some(prior) if prior.hash == self.hash => prior.version,
            Some(prior) => prior.version.saturating_add(1),
            None => 1,
        };
        Self { version, ..self }
    }
}
