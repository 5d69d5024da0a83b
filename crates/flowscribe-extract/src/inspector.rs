//! Step inspection through the properties panel.
//!
//! Inspecting a step clicks it, waits for the editor to settle and reads the
//! properties panel docked in the right half of the viewport. The click
//! changes the editor's selection, so every inspection ends with a click on
//! an empty region whatever its outcome.

use std::time::Duration;

use flowscribe_config::ExtractionConfig;
use flowscribe_protocols::{
    ElementQuery, ExtractionError, ParameterDescriptor, Renderer, RendererError,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::locator::StepCandidate;

/// Labels the editor uses for well-known properties, with their keys.
pub const KNOWN_PROPERTY_LABELS: &[(&str, &str)] = &[
    ("Type:", "type"),
    ("Key:", "key"),
    ("Value:", "value"),
    ("Only when:", "only_when"),
    ("Thing to change:", "thing_to_change"),
    ("Data source:", "data_source"),
    ("List to change:", "list_to_change"),
    ("API Workflow:", "api_workflow"),
    ("Workflow:", "workflow"),
    ("Scheduled date:", "scheduled_date"),
    ("Interval:", "interval"),
    ("Event:", "event"),
    ("To:", "to"),
    ("Subject:", "subject"),
    ("Body:", "body"),
    ("Email:", "email"),
    ("Password:", "password"),
    ("Ignore privacy rules:", "ignore_privacy_rules"),
];

static PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Parameter[^:\n]{0,40}):[ \t]*([^\n]*)").expect("valid parameter pattern")
});

/// Key/value content read from a properties panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelContents {
    /// Property key to value, in panel read order.
    pub properties: IndexMap<String, String>,
    pub parameters: Vec<ParameterDescriptor>,
}

impl PanelContents {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.parameters.is_empty()
    }
}

/// Parse panel text into properties and parameters.
///
/// Known labels are matched first, then any other `label: value` line. When
/// a key repeats, the first value is kept.
pub fn parse_panel(text: &str) -> PanelContents {
    let mut properties = IndexMap::new();
    let mut generic = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match known_property(line) {
            Some((key, value)) => {
                if !value.is_empty() {
                    properties.entry(key.to_string()).or_insert_with(|| value.to_string());
                }
            }
            None => generic.push(line),
        }
    }

    for line in generic {
        if let Some((key, value)) = generic_property(line) {
            properties.entry(key).or_insert(value);
        }
    }

    PanelContents {
        properties,
        parameters: parse_parameters(text),
    }
}

fn known_property(line: &str) -> Option<(&'static str, &str)> {
    KNOWN_PROPERTY_LABELS
        .iter()
        .find_map(|(label, key)| line.strip_prefix(label).map(|rest| (*key, rest.trim())))
}

fn generic_property(line: &str) -> Option<(String, String)> {
    let (label, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() || value.starts_with("//") {
        return None;
    }
    let key = property_key(label);
    if key.is_empty() || label.len() > 48 {
        return None;
    }
    Some((key, value.to_string()))
}

/// `"Thing to change"` becomes `"thing_to_change"`.
pub fn property_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

fn parse_parameters(text: &str) -> Vec<ParameterDescriptor> {
    PARAMETER
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim();
            let value = caps.get(2)?.as_str().trim();
            (!value.is_empty()).then(|| (label.to_string(), value.to_string()))
        })
        .enumerate()
        .map(|(i, (label, value))| ParameterDescriptor {
            index: i + 1,
            label,
            value,
        })
        .collect()
}

/// Drives the click-and-read cycle for one step at a time.
pub struct StepInspector<'a> {
    renderer: &'a dyn Renderer,
    config: &'a ExtractionConfig,
    panel_query: ElementQuery,
}

impl<'a> StepInspector<'a> {
    pub fn new(renderer: &'a dyn Renderer, config: &'a ExtractionConfig) -> Self {
        Self {
            renderer,
            config,
            panel_query: ElementQuery::css(&config.selectors.panel),
        }
    }

    /// Inspect a step, retrying once with the longer settle delay when the
    /// panel does not show up.
    pub async fn inspect(&self, candidate: &StepCandidate) -> Result<PanelContents, ExtractionError> {
        let timing = &self.config.timing;
        match self.inspect_once(candidate, timing.click_settle()).await {
            Err(e) if e.is_transient() => {
                debug!(order = candidate.order, error = %e, "Retrying step inspection");
                self.inspect_once(candidate, timing.retry_settle()).await
            }
            other => other,
        }
    }

    /// One click-settle-read attempt, always followed by a neutral click.
    pub async fn inspect_once(
        &self,
        candidate: &StepCandidate,
        settle: Duration,
    ) -> Result<PanelContents, ExtractionError> {
        let outcome = self.read_step_panel(candidate, settle).await;
        let restored = self.restore_neutral().await;

        match (outcome, restored) {
            (Err(e), _) if e.is_fatal() => Err(e),
            (_, Err(e)) if e.is_fatal() => Err(e.into()),
            (Err(e), _) => Err(e),
            (Ok(contents), _) => Ok(contents),
        }
    }

    async fn read_step_panel(
        &self,
        candidate: &StepCandidate,
        settle: Duration,
    ) -> Result<PanelContents, ExtractionError> {
        let (x, y) = candidate.bounding_box.center();
        self.renderer.click_at(x, y).await?;
        self.renderer.wait_settled(settle).await?;

        let text = self.read_panel().await?.ok_or_else(|| {
            ExtractionError::TransientUi(format!(
                "properties panel not visible for step {}",
                candidate.order
            ))
        })?;
        Ok(parse_panel(&text))
    }

    /// Text of the first non-empty panel in the right half of the viewport.
    pub async fn read_panel(&self) -> Result<Option<String>, RendererError> {
        let midline = self.renderer.viewport().await?.midline_x();

        for handle in self.renderer.query_all(&self.panel_query).await? {
            let Some(bbox) = self.renderer.bounding_box(&handle).await? else {
                continue;
            };
            if !bbox.has_area() || bbox.x < midline {
                continue;
            }
            let text = self.renderer.text_content(&handle).await?;
            if !text.trim().is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    /// Click the configured empty region to clear the selection.
    pub async fn restore_neutral(&self) -> Result<(), RendererError> {
        let point = &self.config.neutral_point;
        self.renderer.click_at(point.x, point.y).await?;
        self.renderer
            .wait_settled(self.config.timing.click_settle())
            .await
    }
}

#[cfg(test)]
#[path = "inspector_tests.rs"]
mod tests;
