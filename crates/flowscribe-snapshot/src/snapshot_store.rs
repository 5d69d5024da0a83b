//! Snapshot persistence over a [`Store`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowscribe_protocols::{SessionSummary, Store, StoreError, WorkflowRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::index::{IndexEntry, SnapshotIndex};
use crate::layout::{INDEX_FILE, session_dir, snapshot_path, summary_path};

/// What `save` wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageReceipt {
    pub workflow_id: String,
    pub path: PathBuf,
    pub hash: String,
    pub version: u32,
    pub bytes: usize,
}

/// Saves workflow records and finds earlier snapshots of the same workflow.
pub struct SnapshotStore {
    store: Arc<dyn Store>,
    /// Serializes read-modify-write cycles on the index.
    index_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            index_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Write `record` into the session directory and make it the latest
    /// snapshot of its workflow.
    pub async fn save(
        &self,
        session_id: &str,
        record: &WorkflowRecord,
    ) -> Result<StorageReceipt, StoreError> {
        self.store.ensure_dir(&session_dir(session_id)).await?;

        let path = snapshot_path(session_id, &record.workflow_id, &record.wf_item);
        let content = serde_json::to_string_pretty(record)?;
        self.store.write(&path, &content).await?;

        let entry = IndexEntry {
            wf_item: record.wf_item.clone(),
            path: path.to_string_lossy().into_owned(),
            hash: record.hash.clone(),
            version: record.version,
            session_id: session_id.to_string(),
            captured_at: record.captured_at,
        };
        // The document is saved either way; a stale index only drops the
        // next run's change detection for this workflow.
        if let Err(e) = self.update_index(&record.workflow_id, entry).await {
            warn!(
                workflow = %record.workflow_id,
                "Saved {:?} but could not update the snapshot index: {}",
                path,
                e
            );
        }

        debug!(
            workflow = %record.workflow_id,
            version = record.version,
            "Saved snapshot to {:?}",
            path
        );

        Ok(StorageReceipt {
            workflow_id: record.workflow_id.clone(),
            path,
            hash: record.hash.clone(),
            version: record.version,
            bytes: content.len(),
        })
    }

    /// Most recent saved snapshot of the workflow identified by
    /// `workflow_id` and its source `wf_item`, from any session.
    pub async fn load_prior(
        &self,
        workflow_id: &str,
        wf_item: &str,
    ) -> Result<Option<WorkflowRecord>, StoreError> {
        let index = self.read_index().await?;
        let Some(entry) = index.get(workflow_id, wf_item) else {
            return Ok(None);
        };

        match self.load(Path::new(&entry.path)).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound(path)) => {
                warn!(workflow = %workflow_id, "Indexed snapshot {} is missing", path);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read one snapshot document.
    pub async fn load(&self, path: &Path) -> Result<WorkflowRecord, StoreError> {
        let content = self.store.read(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn write_summary(&self, summary: &SessionSummary) -> Result<PathBuf, StoreError> {
        self.store.ensure_dir(&session_dir(&summary.session_id)).await?;

        let path = summary_path(&summary.session_id);
        let content = serde_json::to_string_pretty(summary)?;
        self.store.write(&path, &content).await?;

        debug!("Wrote session summary to {:?}", path);
        Ok(path)
    }

    pub async fn read_summary(&self, session_id: &str) -> Result<SessionSummary, StoreError> {
        let content = self.store.read(&summary_path(session_id)).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Current index. A missing index is empty; an unreadable one is
    /// reported and treated as empty so new snapshots can rebuild it.
    pub async fn read_index(&self) -> Result<SnapshotIndex, StoreError> {
        match self.store.read(Path::new(INDEX_FILE)).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(index) => Ok(index),
                Err(e) => {
                    warn!("Ignoring unreadable snapshot index: {}", e);
                    Ok(SnapshotIndex::default())
                }
            },
            Err(StoreError::NotFound(_)) => Ok(SnapshotIndex::default()),
            Err(e) => Err(e),
        }
    }

    async fn update_index(&self, workflow_id: &str, entry: IndexEntry) -> Result<(), StoreError> {
        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        index.insert(workflow_id, entry);
        let content = serde_json::to_string_pretty(&index)?;
        self.store.write(Path::new(INDEX_FILE), &content).await
    }
}

#[cfg(test)]
#[path = "snapshot_store_tests.rs"]
mod tests;
