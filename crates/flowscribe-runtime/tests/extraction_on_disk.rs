//! End-to-end extraction into a filesystem snapshot store.

use std::sync::Arc;

use flowscribe_config::{ExtractionConfig, TimingConfig};
use flowscribe_protocols::{WorkflowRecord, WorkflowStatus};
use flowscribe_runtime::{ExtractionSession, Orchestrator};
use flowscribe_snapshot::{FsStore, SnapshotStore};
use flowscribe_testkit::{FakeRenderer, FakeWorkflow};
use tempfile::TempDir;

fn config() -> ExtractionConfig {
    ExtractionConfig {
        editor_url: "https://editor.example/app".to_string(),
        timing: TimingConfig::immediate(),
        ..Default::default()
    }
}

fn renderer() -> FakeRenderer {
    FakeRenderer::new(&config())
        .with_workflow(
            FakeWorkflow::new("send-welcome")
                .wf_item("bTGzk")
                .page_text("API Workflow send-welcome")
                .step(1, "Create a new thing", "Type: User")
                .step(2, "Schedule API Workflow", "API Workflow: notify-admin")
                .step(3, "Return data", "Status: ok"),
        )
        .with_workflow(
            FakeWorkflow::new("notify-admin")
                .wf_item("cA91x")
                .step(1, "Send email", "To: admin@example.com"),
        )
}

#[tokio::test]
async fn test_session_layout_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store = FsStore::new(temp_dir.path()).await.unwrap();
    let snapshots = Arc::new(SnapshotStore::new(Arc::new(store)));
    let config = config();

    let session = ExtractionSession::open(Arc::new(renderer()), snapshots.clone(), &config)
        .await
        .unwrap();
    let report = Orchestrator::new(config).run(&session).await;
    let session_id = session.close();

    assert!(!report.was_aborted());
    assert!(
        report
            .summary
            .workflows
            .iter()
            .all(|w| w.status == WorkflowStatus::Complete)
    );

    let session_dir = temp_dir.path().join(&session_id);
    assert!(session_dir.join("send-welcome_bTGzk.json").is_file());
    assert!(session_dir.join("notify-admin_cA91x.json").is_file());
    assert!(session_dir.join("extraction-summary.json").is_file());
    assert!(temp_dir.path().join("snapshots-index.json").is_file());

    let content = std::fs::read_to_string(session_dir.join("send-welcome_bTGzk.json")).unwrap();
    let record: WorkflowRecord = serde_json::from_str(&content).unwrap();
    assert_eq!(record.dependencies, vec!["notify-admin".to_string()]);
    assert_eq!(record.interface.outputs, vec!["status".to_string()]);
    assert_eq!(record.steps.len(), 3);
}

#[tokio::test]
async fn test_second_session_reuses_prior_snapshots() {
    let temp_dir = TempDir::new().unwrap();
    let renderer = Arc::new(renderer());
    let config = config();

    let mut sessions = Vec::new();
    for _ in 0..2 {
        let store = FsStore::new(temp_dir.path()).await.unwrap();
        let snapshots = Arc::new(SnapshotStore::new(Arc::new(store)));
        let session = ExtractionSession::open(renderer.clone(), snapshots, &config)
            .await
            .unwrap();
        let report = Orchestrator::new(config.clone()).run(&session).await;
        sessions.push((session.close(), report));
    }

    let (_, second) = &sessions[1];
    assert_eq!(second.changed().count(), 0);
    assert!(second.saved.iter().all(|w| w.version == 1));
}
