//! `flowscribe diff`: step-level changes between two snapshots.

use std::path::Path;

use flowscribe_protocols::WorkflowRecord;
use flowscribe_snapshot::compare;

async fn read_record(path: &Path) -> Result<WorkflowRecord, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let record = serde_json::from_str(&content)
        .map_err(|e| format!("{}: not a workflow snapshot: {}", path.display(), e))?;
    Ok(record)
}

pub(crate) async fn run(old: &Path, new: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let old_record = read_record(old).await?;
    let new_record = read_record(new).await?;

    if old_record.workflow_id != new_record.workflow_id {
        tracing::warn!(
            "Comparing different workflows: {} vs {}",
            old_record.workflow_id,
            new_record.workflow_id
        );
    }

    let changes = compare(&old_record, &new_record);
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}
