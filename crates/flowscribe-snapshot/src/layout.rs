//! Document paths inside a snapshot store.

use std::path::{Component, Path, PathBuf};

use flowscribe_protocols::StoreError;

pub const INDEX_FILE: &str = "snapshots-index.json";
pub const SUMMARY_FILE: &str = "extraction-summary.json";

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn session_dir(session_id: &str) -> PathBuf {
    PathBuf::from(sanitize_component(session_id))
}

/// `{session}/{workflow_id}_{wf_item}.json`, or `{session}/{workflow_id}.json`
/// when the source identifier is empty.
pub fn snapshot_path(session_id: &str, workflow_id: &str, wf_item: &str) -> PathBuf {
    let name = sanitize_component(workflow_id);
    let file = if wf_item.is_empty() {
        format!("{name}.json")
    } else {
        format!("{name}_{}.json", sanitize_component(wf_item))
    };
    session_dir(session_id).join(file)
}

pub fn summary_path(session_id: &str) -> PathBuf {
    session_dir(session_id).join(SUMMARY_FILE)
}

/// Reject paths that are absolute or climb out of the store root.
pub fn check_relative(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidPath("empty path".to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(StoreError::InvalidPath(path.display().to_string())),
        }
    }
    Ok(())
}
