//! Document stores.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flowscribe_protocols::{Store, StoreError};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::layout::check_relative;

/// In-memory store for testing and dry runs.
pub struct MemoryStore {
    documents: RwLock<HashMap<PathBuf, String>>,
    dirs: RwLock<HashSet<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            dirs: RwLock::new(HashSet::new()),
        }
    }

    /// Paths of all stored documents, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let documents = self.documents.read().await;
        let mut paths: Vec<PathBuf> = documents.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub async fn has_dir(&self, path: &Path) -> bool {
        self.dirs.read().await.contains(path)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        check_relative(path)?;
        let mut documents = self.documents.write().await;
        documents.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<String, StoreError> {
        check_relative(path)?;
        let documents = self.documents.read().await;
        documents
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.display().to_string()))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StoreError> {
        check_relative(path)?;
        let mut dirs = self.dirs.write().await;
        dirs.insert(path.to_path_buf());
        Ok(())
    }
}

/// File system store rooted at a base directory.
///
/// Every path handed to the store is relative to the root; absolute paths
/// and `..` components are rejected. Writes go to a temporary sibling first
/// and are renamed into place, so a crash never leaves a truncated document.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store, creating the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        debug!("FsStore initialized at {:?}", root);

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, StoreError> {
        check_relative(path)?;
        Ok(self.root.join(path))
    }

    fn temp_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        target.with_file_name(name)
    }
}

#[async_trait]
impl Store for FsStore {
    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = Self::temp_path(&target);
        fs::write(&temp, content).await?;
        fs::rename(&temp, &target).await?;

        debug!("Wrote {} bytes to {:?}", content.len(), target);
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        match fs::read_to_string(&target).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
