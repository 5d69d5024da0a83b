//! Test doubles for flowscribe.
//!
//! [`FakeRenderer`] plays a scripted workflow editor: a navigation list of
//! [`FakeWorkflow`]s, step elements with fixed geometry, and a properties
//! panel that appears when a step is clicked. Failures (panels that stay
//! hidden, selections that miss, a destroyed page) are scripted per workflow
//! so extraction code can be exercised without a browser.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use flowscribe_config::{ExtractionConfig, SelectorConfig};
use flowscribe_protocols::{
    BoundingBox, ElementHandle, ElementQuery, Renderer, RendererError, ScreenshotOptions, Viewport,
};
use parking_lot::Mutex;
use regex::Regex;

const PANEL: i64 = 1;
const DECOY_PANEL: i64 = 2;
const PAGE: i64 = 3;
const NAV_BASE: i64 = 1_000;
const ELEMENT_STRIDE: i64 = 100_000;

/// X of the default step column; inside the default canvas band.
pub const STEP_X: f64 = 400.0;

/// Default on-canvas box for step `order`.
pub fn step_box(order: u32) -> BoundingBox {
    BoundingBox::new(STEP_X, 100.0 + 90.0 * (order as f64 - 1.0), 240.0, 60.0)
}

#[derive(Debug, Clone)]
struct FakeElement {
    text: String,
    bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone)]
struct FakePanel {
    text: String,
    failures: usize,
}

/// One scripted workflow in the navigation list.
#[derive(Debug, Clone)]
pub struct FakeWorkflow {
    name: String,
    wf_item: Option<String>,
    elements: Vec<FakeElement>,
    panels: BTreeMap<u32, FakePanel>,
    workflow_panel: Option<String>,
    page_text: String,
    hidden_locates: usize,
}

impl FakeWorkflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wf_item: None,
            elements: Vec::new(),
            panels: BTreeMap::new(),
            workflow_panel: None,
            page_text: String::new(),
            hidden_locates: 0,
        }
    }

    pub fn wf_item(mut self, wf_item: impl Into<String>) -> Self {
        self.wf_item = Some(wf_item.into());
        self
    }

    /// Add `Step <order>: <title>` at the default position with a panel.
    pub fn step(self, order: u32, title: &str, panel: &str) -> Self {
        self.element(format!("Step {order}: {title}"), step_box(order))
            .panel(order, panel)
    }

    /// Add an arbitrary element in document order.
    pub fn element(mut self, text: impl Into<String>, bbox: BoundingBox) -> Self {
        self.elements.push(FakeElement {
            text: text.into(),
            bbox: Some(bbox),
        });
        self
    }

    /// Add an element that has no layout box.
    pub fn unboxed_element(mut self, text: impl Into<String>) -> Self {
        self.elements.push(FakeElement {
            text: text.into(),
            bbox: None,
        });
        self
    }

    /// Panel text shown when step `order` is clicked.
    pub fn panel(mut self, order: u32, text: &str) -> Self {
        self.panels.insert(
            order,
            FakePanel {
                text: text.to_string(),
                failures: 0,
            },
        );
        self
    }

    /// The panel of step `order` stays hidden for the next `attempts` clicks.
    pub fn failing_panel(mut self, order: u32, attempts: usize) -> Self {
        self.panels
            .entry(order)
            .or_insert_with(|| FakePanel {
                text: String::new(),
                failures: 0,
            })
            .failures = attempts;
        self
    }

    /// Panel text shown right after the workflow is selected.
    pub fn workflow_panel(mut self, text: &str) -> Self {
        self.workflow_panel = Some(text.to_string());
        self
    }

    pub fn page_text(mut self, text: &str) -> Self {
        self.page_text = text.to_string();
        self
    }

    /// The first `attempts` step queries find nothing.
    pub fn hidden_steps(mut self, attempts: usize) -> Self {
        self.hidden_locates = attempts;
        self
    }
}

#[derive(Default)]
struct State {
    workflows: Vec<FakeWorkflow>,
    selected: Option<usize>,
    panel: Option<String>,
    url: String,
    destroyed: bool,
    clicks: Vec<(f64, f64)>,
    selections: Vec<String>,
    settles: Vec<Duration>,
    navigations: Vec<String>,
    screenshots: Vec<PathBuf>,
    selection_failures: HashMap<String, usize>,
    fatal_on: HashSet<String>,
    failing_screenshots: bool,
    fatal_screenshots: bool,
    nav_read_failures: usize,
}

type SelectHook = Box<dyn Fn(&str) + Send + Sync>;

/// Scripted in-memory [`Renderer`].
pub struct FakeRenderer {
    selectors: SelectorConfig,
    editor_url: String,
    viewport: Viewport,
    decoy_panel: bool,
    on_select: Option<SelectHook>,
    state: Mutex<State>,
}

impl FakeRenderer {
    /// Create a renderer answering the queries built from `config`.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            selectors: config.selectors.clone(),
            editor_url: config.editor_url.clone(),
            viewport: Viewport::default(),
            decoy_panel: false,
            on_select: None,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_workflow(self, workflow: FakeWorkflow) -> Self {
        self.state.lock().workflows.push(workflow);
        self
    }

    /// Show an always-visible panel in the left half of the viewport.
    pub fn with_decoy_panel(mut self) -> Self {
        self.decoy_panel = true;
        self
    }

    /// Selecting `name` fails with `ElementNotFound` for `attempts` clicks.
    pub fn failing_selection(self, name: &str, attempts: usize) -> Self {
        self.state
            .lock()
            .selection_failures
            .insert(name.to_string(), attempts);
        self
    }

    /// Selecting `name` destroys the page context.
    pub fn fatal_on_select(self, name: &str) -> Self {
        self.state.lock().fatal_on.insert(name.to_string());
        self
    }

    pub fn failing_screenshots(self) -> Self {
        self.state.lock().failing_screenshots = true;
        self
    }

    /// Screenshots fail as if the browser went away.
    pub fn fatal_screenshots(self) -> Self {
        self.state.lock().fatal_screenshots = true;
        self
    }

    /// The first `reads` text reads of navigation entries fail as if the
    /// entry had been detached.
    pub fn failing_nav_reads(self, reads: usize) -> Self {
        self.state.lock().nav_read_failures = reads;
        self
    }

    /// Run `hook` with the workflow name each time a selection succeeds.
    pub fn on_select(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(hook));
        self
    }

    /// Rename step `order` of `workflow`, as an edit in the editor would.
    pub fn set_step_title(&self, workflow: &str, order: u32, title: &str) {
        let mut state = self.state.lock();
        if let Some(wf) = state.workflows.iter_mut().find(|w| w.name == workflow) {
            for element in &mut wf.elements {
                if step_order(&element.text) == Some(order) {
                    element.text = format!("Step {order}: {title}");
                }
            }
        }
    }

    pub fn clicks(&self) -> Vec<(f64, f64)> {
        self.state.lock().clicks.clone()
    }

    /// Names of workflows selected so far, in order.
    pub fn selections(&self) -> Vec<String> {
        self.state.lock().selections.clone()
    }

    pub fn settles(&self) -> Vec<Duration> {
        self.state.lock().settles.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().screenshots.clone()
    }

    fn check(&self, state: &State) -> Result<(), RendererError> {
        if state.destroyed {
            return Err(RendererError::ContextDestroyed(
                "page context was destroyed".to_string(),
            ));
        }
        Ok(())
    }

    fn nav_index(handle: &ElementHandle) -> Option<usize> {
        let id = handle.id();
        (NAV_BASE..ELEMENT_STRIDE)
            .contains(&id)
            .then(|| (id - NAV_BASE) as usize)
    }

    fn element_index(handle: &ElementHandle) -> Option<(usize, usize)> {
        let id = handle.id();
        if id < ELEMENT_STRIDE {
            return None;
        }
        Some(((id / ELEMENT_STRIDE - 1) as usize, (id % ELEMENT_STRIDE) as usize))
    }

    fn element<'a>(state: &'a State, handle: &ElementHandle) -> Result<&'a FakeElement, RendererError> {
        Self::element_index(handle)
            .and_then(|(w, e)| state.workflows.get(w)?.elements.get(e))
            .ok_or_else(|| RendererError::ElementNotFound(format!("node {}", handle.id())))
    }

    fn panel_box(&self) -> BoundingBox {
        BoundingBox::new(self.viewport.width as f64 * 0.7, 80.0, 350.0, 600.0)
    }

    fn select(&self, index: usize) -> Result<(), RendererError> {
        let name = {
            let mut state = self.state.lock();
            let name = state
                .workflows
                .get(index)
                .map(|w| w.name.clone())
                .ok_or_else(|| RendererError::ElementNotFound(format!("nav item {index}")))?;

            if state.fatal_on.contains(&name) {
                state.destroyed = true;
                return Err(RendererError::ContextDestroyed(
                    "execution context was destroyed".to_string(),
                ));
            }
            if let Some(remaining) = state.selection_failures.get_mut(&name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(RendererError::ElementNotFound(format!(
                        "nav item {name} not clickable"
                    )));
                }
            }

            let workflow = &state.workflows[index];
            let url = match &workflow.wf_item {
                Some(id) => format!("{}?tab=BackendWorkflows&wf_item={}", self.editor_url, id),
                None => format!("{}?tab=BackendWorkflows", self.editor_url),
            };
            let panel = workflow.workflow_panel.clone();
            state.url = url;
            state.panel = panel;
            state.selected = Some(index);
            state.selections.push(name.clone());
            name
        };

        if let Some(hook) = &self.on_select {
            hook(&name);
        }
        Ok(())
    }
}

fn step_order(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix("Step")?;
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if rest.len() == rest.trim_start().len() || digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn navigate(&self, url: &str) -> Result<(), RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        state.navigations.push(url.to_string());
        state.url = url.to_string();
        state.selected = None;
        state.panel = None;
        Ok(())
    }

    async fn wait_settled(&self, duration: Duration) -> Result<(), RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        state.settles.push(duration);
        Ok(())
    }

    async fn query_all(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;

        match query {
            ElementQuery::Css(selector) if *selector == self.selectors.nav_item => Ok((0
                ..state.workflows.len())
                .map(|i| ElementHandle::new(NAV_BASE + i as i64))
                .collect()),
            ElementQuery::Css(selector) if *selector == self.selectors.panel => {
                let mut handles = Vec::new();
                if self.decoy_panel {
                    handles.push(ElementHandle::new(DECOY_PANEL));
                }
                if state.panel.is_some() {
                    handles.push(ElementHandle::new(PANEL));
                }
                Ok(handles)
            }
            ElementQuery::Css(selector) if *selector == self.selectors.page => {
                Ok(vec![ElementHandle::new(PAGE)])
            }
            ElementQuery::Matching { selector, pattern } if *selector == self.selectors.step => {
                let pattern = Regex::new(pattern)
                    .map_err(|e| RendererError::Protocol(format!("bad pattern: {e}")))?;
                let Some(index) = state.selected else {
                    return Ok(Vec::new());
                };
                let workflow = &mut state.workflows[index];
                if workflow.hidden_locates > 0 {
                    workflow.hidden_locates -= 1;
                    return Ok(Vec::new());
                }
                Ok(workflow
                    .elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| pattern.is_match(e.text.trim()))
                    .map(|(j, _)| ElementHandle::new((index as i64 + 1) * ELEMENT_STRIDE + j as i64))
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn bounding_box(&self, element: &ElementHandle) -> Result<Option<BoundingBox>, RendererError> {
        let state = self.state.lock();
        self.check(&state)?;

        match element.id() {
            PANEL => Ok(Some(self.panel_box())),
            DECOY_PANEL => Ok(Some(BoundingBox::new(10.0, 80.0, 220.0, 400.0))),
            PAGE => Ok(Some(BoundingBox::new(
                0.0,
                0.0,
                self.viewport.width as f64,
                self.viewport.height as f64,
            ))),
            _ => {
                if let Some(i) = Self::nav_index(element) {
                    return Ok(Some(BoundingBox::new(20.0, 100.0 + 30.0 * i as f64, 200.0, 24.0)));
                }
                Ok(Self::element(&state, element)?.bbox)
            }
        }
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<String, RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;

        match element.id() {
            PANEL => state
                .panel
                .clone()
                .ok_or_else(|| RendererError::ElementNotFound("properties panel".to_string())),
            DECOY_PANEL => Ok("Type: Decoy\nKey: sidebar".to_string()),
            PAGE => Ok(state
                .selected
                .map(|i| state.workflows[i].page_text.clone())
                .unwrap_or_default()),
            _ => {
                if let Some(i) = Self::nav_index(element) {
                    if state.nav_read_failures > 0 {
                        state.nav_read_failures -= 1;
                        return Err(RendererError::ElementNotFound(format!(
                            "nav item {i} detached"
                        )));
                    }
                    return state
                        .workflows
                        .get(i)
                        .map(|w| w.name.clone())
                        .ok_or_else(|| RendererError::ElementNotFound(format!("nav item {i}")));
                }
                Ok(Self::element(&state, element)?.text.clone())
            }
        }
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, RendererError> {
        let state = self.state.lock();
        self.check(&state)?;

        match Self::nav_index(element) {
            Some(i) if name == self.selectors.wf_item_attribute => {
                Ok(state.workflows.get(i).and_then(|w| w.wf_item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        state.clicks.push((x, y));

        let Some(index) = state.selected else {
            state.panel = None;
            return Ok(());
        };
        let workflow = &mut state.workflows[index];
        let hit = workflow
            .elements
            .iter()
            .filter(|e| e.bbox.is_some_and(|b| b.contains(x, y)))
            .find_map(|e| step_order(&e.text));

        let panel = match hit.and_then(|order| workflow.panels.get_mut(&order)) {
            Some(panel) if panel.failures > 0 => {
                panel.failures -= 1;
                None
            }
            Some(panel) => Some(panel.text.clone()),
            None => None,
        };
        state.panel = panel;
        Ok(())
    }

    async fn click_element(&self, element: &ElementHandle) -> Result<(), RendererError> {
        {
            let state = self.state.lock();
            self.check(&state)?;
        }
        match Self::nav_index(element) {
            Some(index) => self.select(index),
            None => {
                let bbox = {
                    let state = self.state.lock();
                    Self::element(&state, element)?.bbox
                };
                let bbox = bbox.ok_or_else(|| {
                    RendererError::ElementNotFound(format!("node {} has no box", element.id()))
                })?;
                let (x, y) = bbox.center();
                self.click_at(x, y).await
            }
        }
    }

    async fn current_url(&self) -> Result<String, RendererError> {
        let state = self.state.lock();
        self.check(&state)?;
        Ok(state.url.clone())
    }

    async fn viewport(&self) -> Result<Viewport, RendererError> {
        let state = self.state.lock();
        self.check(&state)?;
        Ok(self.viewport)
    }

    async fn screenshot(&self, path: &Path, _options: &ScreenshotOptions) -> Result<(), RendererError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        if state.fatal_screenshots {
            return Err(RendererError::SessionClosed);
        }
        if state.failing_screenshots {
            return Err(RendererError::Protocol("screenshot failed".to_string()));
        }
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }
}
