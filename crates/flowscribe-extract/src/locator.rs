//! Step discovery on the canvas.

use std::collections::BTreeMap;

use flowscribe_config::SelectorConfig;
use flowscribe_protocols::{BoundingBox, ElementHandle, ElementQuery, Renderer, RendererError};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::geometry::CanvasFilter;
use crate::normalizer::normalize;

static STEP_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Step\s+(\d+)").expect("valid step number pattern"));

/// One element as read from the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedElement {
    pub handle: ElementHandle,
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
}

/// Elements in document order, captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    pub elements: Vec<RenderedElement>,
}

impl RenderSnapshot {
    pub fn new(elements: Vec<RenderedElement>) -> Self {
        Self { elements }
    }
}

/// A located step, ready for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCandidate {
    pub order: u32,
    pub raw_text: String,
    /// `raw_text` after normalization.
    pub title: String,
    pub bounding_box: BoundingBox,
    pub handle: ElementHandle,
}

/// Extract the step number from rendered text starting with `Step <N>`.
pub fn step_number(text: &str) -> Option<u32> {
    let caps = STEP_NUMBER.captures(text.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

/// Find step candidates in a snapshot.
///
/// Elements without a step number or outside the canvas are ignored. When
/// several elements carry the same number, the first in document order wins;
/// later ones are nested re-renders of the same step. The result is sorted by
/// step number and may be empty.
pub fn locate(snapshot: &RenderSnapshot, filter: &dyn CanvasFilter) -> Vec<StepCandidate> {
    let mut by_order: BTreeMap<u32, StepCandidate> = BTreeMap::new();

    for element in &snapshot.elements {
        let Some(order) = step_number(&element.text) else {
            continue;
        };
        let Some(bbox) = element.bounding_box else {
            continue;
        };
        if !filter.is_canvas_element(&bbox) {
            continue;
        }

        by_order.entry(order).or_insert_with(|| StepCandidate {
            order,
            raw_text: element.text.clone(),
            title: normalize(&element.text),
            bounding_box: bbox,
            handle: element.handle,
        });
    }

    by_order.into_values().collect()
}

/// Reads step elements from a renderer and locates candidates among them.
pub struct StepLocator {
    query: ElementQuery,
    filter: Box<dyn CanvasFilter>,
}

impl StepLocator {
    pub fn new(selectors: &SelectorConfig, filter: Box<dyn CanvasFilter>) -> Self {
        Self {
            query: ElementQuery::matching(&selectors.step, &selectors.step_pattern),
            filter,
        }
    }

    /// Capture text and geometry of every element matching the step query.
    ///
    /// Elements that disappear between the query and the read are dropped.
    pub async fn snapshot(&self, renderer: &dyn Renderer) -> Result<RenderSnapshot, RendererError> {
        let handles = renderer.query_all(&self.query).await?;
        let mut elements = Vec::with_capacity(handles.len());

        for handle in handles {
            match read_element(renderer, handle).await {
                Ok(element) => elements.push(element),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(node = handle.id(), error = %e, "Dropping unreadable element"),
            }
        }

        Ok(RenderSnapshot::new(elements))
    }

    pub fn locate(&self, snapshot: &RenderSnapshot) -> Vec<StepCandidate> {
        locate(snapshot, self.filter.as_ref())
    }

    /// Snapshot the page and locate steps in one go.
    pub async fn locate_on(&self, renderer: &dyn Renderer) -> Result<Vec<StepCandidate>, RendererError> {
        let snapshot = self.snapshot(renderer).await?;
        let candidates = self.locate(&snapshot);
        debug!(
            elements = snapshot.elements.len(),
            candidates = candidates.len(),
            "Located steps"
        );
        Ok(candidates)
    }
}

async fn read_element(
    renderer: &dyn Renderer,
    handle: ElementHandle,
) -> Result<RenderedElement, RendererError> {
    let text = renderer.text_content(&handle).await?;
    let bounding_box = renderer.bounding_box(&handle).await?;
    Ok(RenderedElement {
        handle,
        text,
        bounding_box,
    })
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
