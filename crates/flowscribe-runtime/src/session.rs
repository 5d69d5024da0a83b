//! Extraction session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flowscribe_config::ExtractionConfig;
use flowscribe_protocols::{ExtractionError, Renderer};
use flowscribe_snapshot::SnapshotStore;
use tracing::info;
use uuid::Uuid;

/// `20260301-120000-1a2b3c4d`: sortable by start time, unique per run.
pub fn new_session_id(started_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", started_at.format("%Y%m%d-%H%M%S"), &suffix[..8])
}

/// One extraction run against one renderer.
///
/// The session owns the renderer for its lifetime: nothing else may drive
/// the page while it is open.
pub struct ExtractionSession {
    id: String,
    started_at: DateTime<Utc>,
    renderer: Arc<dyn Renderer>,
    snapshots: Arc<SnapshotStore>,
    screenshot_dir: Option<PathBuf>,
    open: bool,
}

impl ExtractionSession {
    /// Open a session: load the editor page and let it settle.
    pub async fn open(
        renderer: Arc<dyn Renderer>,
        snapshots: Arc<SnapshotStore>,
        config: &ExtractionConfig,
    ) -> Result<Self, ExtractionError> {
        let started_at = Utc::now();
        let id = new_session_id(started_at);

        if !config.editor_url.is_empty() {
            renderer.navigate(&config.editor_url).await?;
            renderer
                .wait_settled(config.timing.navigation_settle())
                .await?;
        }

        info!(session = %id, "Extraction session opened");

        Ok(Self {
            id,
            started_at,
            renderer,
            snapshots,
            screenshot_dir: None,
            open: true,
        })
    }

    /// Write one screenshot per saved workflow into `dir`.
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn screenshot_dir(&self) -> Option<&Path> {
        self.screenshot_dir.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// End the session, releasing the renderer.
    pub fn close(mut self) -> String {
        self.open = false;
        info!(session = %self.id, "Extraction session closed");
        self.id
    }
}
