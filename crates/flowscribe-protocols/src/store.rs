//! Store protocol definitions.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StoreError;

/// Document store that snapshots are persisted through.
///
/// Paths are relative to the store's own root.
#[async_trait]
pub trait Store: Send + Sync {
    /// Write (create or replace) a document.
    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError>;

    /// Read a document. Returns [`StoreError::NotFound`] when absent.
    async fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// Ensure a directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<(), StoreError>;
}
