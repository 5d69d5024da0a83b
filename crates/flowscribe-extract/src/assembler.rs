//! Workflow record assembly.
//!
//! Pure composition of located and inspected steps into a hashed
//! [`WorkflowRecord`]. No renderer, no store.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use flowscribe_protocols::{
    ActionType, StepRecord, TriggerInfo, TriggerType, WorkflowInterface, WorkflowMetadata,
    WorkflowRecord,
};

use crate::hashing::{record_hash, step_hash};
use crate::inspector::PanelContents;
use crate::locator::StepCandidate;
use crate::normalizer::classify;

/// Page phrases that identify a trigger, in priority order.
pub const TRIGGER_PHRASES: &[(&str, TriggerType)] = &[
    ("API Workflow", TriggerType::ApiWorkflow),
    ("Schedule API", TriggerType::ScheduledApi),
    ("Custom event", TriggerType::CustomEvent),
];

/// Step properties whose values name another workflow or event.
pub const DEPENDENCY_KEYS: &[&str] = &["api_workflow", "workflow", "event"];

const FALLBACK_WORKFLOW_ID: &str = "workflow";

/// Identity of the workflow being assembled.
#[derive(Debug, Clone)]
pub struct WorkflowMeta {
    pub name: String,
    pub wf_item: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
}

/// A located step and, if inspection succeeded, its panel contents.
#[derive(Debug, Clone)]
pub struct InspectedStep {
    pub candidate: StepCandidate,
    pub contents: Option<PanelContents>,
}

impl InspectedStep {
    pub fn complete(candidate: StepCandidate, contents: PanelContents) -> Self {
        Self {
            candidate,
            contents: Some(contents),
        }
    }

    pub fn incomplete(candidate: StepCandidate) -> Self {
        Self {
            candidate,
            contents: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.contents.is_some()
    }
}

/// Workflow-level page text and panel, read right after selection.
#[derive(Debug, Clone, Default)]
pub struct PanelMetadata {
    pub page_text: String,
    pub panel: Option<PanelContents>,
}

/// Keep only `[A-Za-z0-9_-]`.
pub fn sanitize_identifier(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Identifier for a workflow: its sanitized name, else its sanitized source
/// identifier, else a fixed fallback.
pub fn workflow_id(name: &str, wf_item: &str) -> String {
    [name, wf_item]
        .iter()
        .map(|value| sanitize_identifier(value))
        .find(|id| !id.is_empty())
        .unwrap_or_else(|| FALLBACK_WORKFLOW_ID.to_string())
}

pub fn detect_trigger(page_text: &str) -> Option<TriggerType> {
    TRIGGER_PHRASES
        .iter()
        .find(|(phrase, _)| page_text.contains(phrase))
        .map(|(_, trigger)| *trigger)
}

/// Assemble a record with version 1 and all hashes computed.
///
/// Steps are ordered by `order`; when two share an order the first one
/// passed in is kept. Incomplete steps keep their title and action but have
/// empty properties and parameters.
pub fn assemble(
    meta: &WorkflowMeta,
    steps: Vec<InspectedStep>,
    panel_metadata: &PanelMetadata,
) -> WorkflowRecord {
    let mut steps = steps;
    steps.sort_by_key(|s| s.candidate.order);
    steps.dedup_by_key(|s| s.candidate.order);

    let steps: Vec<StepRecord> = steps.into_iter().map(step_record).collect();
    let dependencies = dependencies(&steps);
    let outputs = outputs(&steps);

    let (properties, inputs) = match &panel_metadata.panel {
        Some(panel) => (panel.properties.clone(), panel.parameters.clone()),
        None => Default::default(),
    };

    let mut record = WorkflowRecord {
        workflow_id: workflow_id(&meta.name, &meta.wf_item),
        wf_item: meta.wf_item.clone(),
        name: meta.name.clone(),
        url: meta.url.clone(),
        captured_at: meta.captured_at,
        version: 1,
        metadata: WorkflowMetadata {
            trigger: TriggerInfo {
                trigger_type: detect_trigger(&panel_metadata.page_text),
            },
            properties,
        },
        interface: WorkflowInterface { inputs, outputs },
        steps,
        dependencies,
        hash: String::new(),
    };
    record.hash = record_hash(&record);
    record
}

fn step_record(step: InspectedStep) -> StepRecord {
    let InspectedStep {
        candidate,
        contents,
    } = step;
    let contents = contents.unwrap_or_default();

    let mut record = StepRecord {
        order: candidate.order,
        action: classify(&candidate.title),
        title: candidate.title,
        properties: contents.properties,
        parameters: contents.parameters,
        position: candidate.bounding_box.position(),
        step_hash: String::new(),
    };
    record.step_hash = step_hash(&record);
    record
}

fn dependencies(steps: &[StepRecord]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for step in steps {
        for key in DEPENDENCY_KEYS {
            if let Some(value) = step.properties.get(*key) {
                names.insert(value.clone());
            }
        }
    }
    names.into_iter().collect()
}

fn outputs(steps: &[StepRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    steps
        .iter()
        .filter(|s| s.action == ActionType::ReturnData)
        .flat_map(|s| s.properties.keys())
        .filter(|key| seen.insert((*key).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod tests;
