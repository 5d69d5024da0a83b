//! Session orchestration.
//!
//! The orchestrator walks the navigation list and, for each workflow,
//! selects it, locates and inspects its steps, assembles a record and saves
//! it. Everything happens strictly in sequence against the session's single
//! renderer. Failures stay as local as possible:
//!
//! - a step whose panel never shows up leaves the workflow `partial`
//! - a workflow that cannot be selected or shows no steps is skipped
//! - a workflow that cannot be saved is listed as failed
//! - a fatal renderer error stops the run; what was saved stays saved
//!
//! Nothing escapes [`Orchestrator::run`]: every outcome ends up in the
//! session summary, which is written even when the run is aborted.

use std::path::PathBuf;

use chrono::Utc;
use flowscribe_config::ExtractionConfig;
use flowscribe_extract::{
    CanvasBand, InspectedStep, PanelMetadata, StepInspector, StepLocator, WorkflowMeta, assemble,
    parse_panel, sanitize_identifier,
};
use flowscribe_protocols::{
    ElementQuery, ExtractionError, Renderer, ScreenshotOptions, SessionSummary, WorkflowIssue,
    WorkflowStatus, WorkflowSummaryEntry,
};
use flowscribe_snapshot::compare;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::report::{SavedWorkflow, SessionReport};
use crate::retry::retry_transient;
use crate::session::ExtractionSession;
use crate::state::OrchestratorState;

/// Retries for selecting a workflow and for locating its steps.
const ITEM_RETRIES: u32 = 1;

/// Reason recorded when a run is cancelled between workflows.
pub const CANCELLED: &str = "cancelled";

/// One entry of the navigation list.
#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
    /// Position in the list when it was enumerated.
    pub index: usize,
    pub name: String,
    /// Source identifier read from the entry's attribute, if present.
    pub wf_item: Option<String>,
}

enum ItemOutcome {
    /// `abort` is a fatal error hit after the snapshot was already saved.
    Saved {
        entry: WorkflowSummaryEntry,
        workflow: SavedWorkflow,
        abort: Option<ExtractionError>,
    },
    Skipped(WorkflowIssue),
}

/// Drives one session through the navigation list.
pub struct Orchestrator {
    config: ExtractionConfig,
    cancel: CancellationToken,
    state: OrchestratorState,
}

impl Orchestrator {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: OrchestratorState::Idle,
        }
    }

    /// Use `token` to stop the run between workflows.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    fn transition(&mut self, next: OrchestratorState) {
        debug!(from = %self.state, to = %next, "Orchestrator state");
        self.state = next;
    }

    /// Extract every selected workflow of the session and write the summary.
    pub async fn run(&mut self, session: &ExtractionSession) -> SessionReport {
        let mut summary = SessionSummary::new(session.id(), session.started_at());
        let mut saved = Vec::new();

        self.transition(OrchestratorState::NavigatingList);
        match self.enumerate_with_retry(session.renderer()).await {
            Ok(items) => {
                summary.total_workflows = items.len();

                for item in self.select_items(items) {
                    if self.cancel.is_cancelled() {
                        info!("Extraction cancelled before '{}'", item.name);
                        summary.aborted = Some(CANCELLED.to_string());
                        break;
                    }

                    match self.extract_item(session, &item).await {
                        Ok(ItemOutcome::Saved {
                            entry,
                            workflow,
                            abort,
                        }) => {
                            summary.workflows.push(entry);
                            saved.push(workflow);
                            if let Some(e) = abort {
                                error!(workflow = %item.name, "Aborting session: {}", e);
                                summary.aborted = Some(e.to_string());
                                break;
                            }
                        }
                        Ok(ItemOutcome::Skipped(issue)) => {
                            warn!(workflow = %issue.name, "Skipped: {}", issue.reason);
                            summary.skipped.push(issue);
                        }
                        Err(e) if e.is_fatal() => {
                            error!(workflow = %item.name, "Aborting session: {}", e);
                            summary.aborted = Some(e.to_string());
                            break;
                        }
                        Err(ExtractionError::Persistence(e)) => {
                            error!(workflow = %item.name, "Failed to save snapshot: {}", e);
                            summary.failed.push(issue_from(&item, e.to_string()));
                        }
                        Err(e) => {
                            warn!(workflow = %item.name, "Skipped: {}", e);
                            summary.skipped.push(issue_from(&item, e.to_string()));
                        }
                    }
                }
            }
            Err(e) => {
                error!("Could not read the navigation list: {}", e);
                summary.aborted = Some(e.to_string());
            }
        }
        self.transition(OrchestratorState::Idle);

        summary.completed_at = Some(Utc::now());
        let summary_path = match session.snapshots().write_summary(&summary).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Failed to write session summary: {}", e);
                None
            }
        };

        info!(
            session = %summary.session_id,
            saved = summary.workflows.len(),
            partial = summary.partial_count(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Extraction finished"
        );

        SessionReport {
            summary,
            summary_path,
            saved,
        }
    }

    /// [`enumerate`](Self::enumerate), retried once on transient errors.
    ///
    /// Only fatal errors are returned. A list that stays unreadable, or
    /// is empty, is a structural mismatch and yields no items.
    async fn enumerate_with_retry(
        &self,
        renderer: &dyn Renderer,
    ) -> Result<Vec<NavItem>, ExtractionError> {
        let retry_settle = self.config.timing.retry_settle();
        let enumerated = retry_transient("enumerate workflows", ITEM_RETRIES, |attempt| async move {
            if attempt > 0 {
                renderer.wait_settled(retry_settle).await?;
            }
            self.enumerate(renderer).await
        })
        .await;

        let items = match enumerated {
            Ok(items) => items,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Navigation list unreadable: {}", e);
                Vec::new()
            }
        };
        if items.is_empty() {
            let mismatch = ExtractionError::StructuralMismatch(format!(
                "no workflow items match '{}'",
                self.config.selectors.nav_item
            ));
            warn!("{}", mismatch);
        }
        Ok(items)
    }

    /// Read names and identifiers of the navigation list.
    pub async fn enumerate(&self, renderer: &dyn Renderer) -> Result<Vec<NavItem>, ExtractionError> {
        let handles = renderer.query_all(&self.nav_query()).await?;
        let mut items = Vec::with_capacity(handles.len());

        for (index, handle) in handles.iter().enumerate() {
            let text = renderer.text_content(handle).await?;
            let name = text
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("workflow-{}", index + 1));
            let wf_item = renderer
                .attribute(handle, &self.config.selectors.wf_item_attribute)
                .await?
                .filter(|v| !v.is_empty());
            items.push(NavItem {
                index,
                name,
                wf_item,
            });
        }

        debug!(count = items.len(), "Enumerated navigation list");
        Ok(items)
    }

    fn select_items(&self, items: Vec<NavItem>) -> Vec<NavItem> {
        let filtered = items.into_iter().filter(|item| match &self.config.name_filter {
            Some(filter) => item.name.contains(filter.as_str()),
            None => true,
        });
        match self.config.max_workflows {
            Some(max) => filtered.take(max).collect(),
            None => filtered.collect(),
        }
    }

    fn nav_query(&self) -> ElementQuery {
        ElementQuery::css(&self.config.selectors.nav_item)
    }

    async fn extract_item(
        &mut self,
        session: &ExtractionSession,
        item: &NavItem,
    ) -> Result<ItemOutcome, ExtractionError> {
        let config = self.config.clone();
        let timing = &config.timing;
        let renderer = session.renderer();

        self.transition(OrchestratorState::Selecting);
        let nav_query = self.nav_query();
        let query = &nav_query;
        retry_transient("select workflow", ITEM_RETRIES, |attempt| {
            let settle = if attempt == 0 {
                timing.selection_settle()
            } else {
                timing.retry_settle()
            };
            async move {
                let handles = renderer.query_all(query).await?;
                let handle = handles.get(item.index).ok_or_else(|| {
                    ExtractionError::TransientUi(format!(
                        "navigation entry {} disappeared",
                        item.index + 1
                    ))
                })?;
                renderer.click_element(handle).await?;
                renderer.wait_settled(settle).await?;
                Ok(())
            }
        })
        .await?;

        let url = renderer.current_url().await?;
        let wf_item = item
            .wf_item
            .clone()
            .or_else(|| wf_item_from_url(&url))
            .unwrap_or_else(|| sanitize_identifier(&item.name));
        let meta = WorkflowMeta {
            name: item.name.clone(),
            wf_item,
            url,
            captured_at: Utc::now(),
        };
        info!(workflow = %meta.name, wf_item = %meta.wf_item, "Extracting workflow");

        let inspector = StepInspector::new(renderer, &config);
        let panel_metadata = self.read_panel_metadata(renderer, &inspector).await?;

        self.transition(OrchestratorState::Locating);
        let step_locator = StepLocator::new(&config.selectors, Box::new(CanvasBand::from(&config.canvas)));
        let locator = &step_locator;
        let located = retry_transient("locate steps", ITEM_RETRIES, |attempt| async move {
            if attempt > 0 {
                renderer.wait_settled(timing.retry_settle()).await?;
            }
            let candidates = locator.locate_on(renderer).await?;
            if candidates.is_empty() {
                return Err(ExtractionError::TransientUi("no steps found".to_string()));
            }
            Ok(candidates)
        })
        .await;
        let candidates = match located {
            Ok(candidates) => candidates,
            Err(e) if e.is_transient() => {
                if !config.save_empty_workflows {
                    return Ok(ItemOutcome::Skipped(issue_for(&meta, e.to_string())));
                }
                debug!(workflow = %meta.name, "Saving workflow without steps");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        self.transition(OrchestratorState::Inspecting);
        let mut steps = Vec::with_capacity(candidates.len());
        let mut incomplete = Vec::new();
        for candidate in candidates {
            match inspector.inspect(&candidate).await {
                Ok(contents) => {
                    debug!(
                        workflow = %meta.name,
                        order = candidate.order,
                        properties = contents.properties.len(),
                        "Inspected step"
                    );
                    steps.push(InspectedStep::complete(candidate, contents));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(workflow = %meta.name, order = candidate.order, "Step left incomplete: {}", e);
                    incomplete.push(candidate.order);
                    steps.push(InspectedStep::incomplete(candidate));
                }
            }
        }

        self.transition(OrchestratorState::Assembling);
        let record = assemble(&meta, steps, &panel_metadata);

        self.transition(OrchestratorState::Saving);
        let snapshots = session.snapshots();
        let prior = match snapshots
            .load_prior(&record.workflow_id, &record.wf_item)
            .await
        {
            Ok(prior) => prior,
            Err(e) => {
                warn!(workflow = %record.workflow_id, "Ignoring unreadable prior snapshot: {}", e);
                None
            }
        };
        let record = record.versioned_after(prior.as_ref());
        let changes = prior.as_ref().map(|p| compare(p, &record));
        let receipt = snapshots.save(session.id(), &record).await?;

        let mut abort = None;
        if let Some(dir) = session.screenshot_dir() {
            let path = dir.join(format!(
                "{}_{}.png",
                record.workflow_id,
                sanitize_identifier(&record.wf_item)
            ));
            abort = self.capture_screenshot(renderer, path).await.err();
        }

        let status = if incomplete.is_empty() {
            WorkflowStatus::Complete
        } else {
            WorkflowStatus::Partial
        };
        info!(
            workflow = %record.name,
            steps = record.steps.len(),
            version = record.version,
            status = ?status,
            "Saved workflow"
        );

        Ok(ItemOutcome::Saved {
            entry: WorkflowSummaryEntry {
                name: record.name.clone(),
                wf_item: record.wf_item.clone(),
                steps_count: record.steps.len(),
                status,
                incomplete_steps: incomplete,
            },
            workflow: SavedWorkflow {
                workflow_id: receipt.workflow_id,
                name: record.name,
                path: receipt.path,
                version: receipt.version,
                changes,
            },
            abort,
        })
    }

    /// Page text and workflow-level panel, read before any step is clicked.
    /// Only fatal errors propagate; anything else yields empty metadata.
    async fn read_panel_metadata(
        &self,
        renderer: &dyn Renderer,
        inspector: &StepInspector<'_>,
    ) -> Result<PanelMetadata, ExtractionError> {
        let page_query = ElementQuery::css(&self.config.selectors.page);
        let page_text = match read_first_text(renderer, &page_query).await {
            Ok(text) => text,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("No page text: {}", e);
                String::new()
            }
        };

        let panel = match inspector.read_panel().await {
            Ok(text) => text.map(|t| parse_panel(&t)),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                debug!("No workflow panel: {}", e);
                None
            }
        };

        Ok(PanelMetadata { page_text, panel })
    }

    async fn capture_screenshot(
        &self,
        renderer: &dyn Renderer,
        path: PathBuf,
    ) -> Result<(), ExtractionError> {
        match renderer.screenshot(&path, &ScreenshotOptions::default()).await {
            Ok(()) => {
                debug!("Captured screenshot {:?}", path);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Screenshot {:?} failed: {}", path, e);
                Ok(())
            }
        }
    }
}

async fn read_first_text(
    renderer: &dyn Renderer,
    query: &ElementQuery,
) -> Result<String, ExtractionError> {
    let handles = renderer.query_all(query).await?;
    match handles.first() {
        Some(handle) => Ok(renderer.text_content(handle).await?),
        None => Ok(String::new()),
    }
}

/// `wf_item` query parameter of an editor URL.
pub fn wf_item_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "wf_item")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn issue_from(item: &NavItem, reason: String) -> WorkflowIssue {
    WorkflowIssue {
        name: item.name.clone(),
        wf_item: item.wf_item.clone(),
        reason,
    }
}

fn issue_for(meta: &WorkflowMeta, reason: String) -> WorkflowIssue {
    WorkflowIssue {
        name: meta.name.clone(),
        wf_item: Some(meta.wf_item.clone()),
        reason,
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
