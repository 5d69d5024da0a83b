use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use flowscribe_config::TimingConfig;
use flowscribe_protocols::{ActionType, Store, StoreError, WorkflowRecord};
use flowscribe_snapshot::{MemoryStore, SnapshotStore};
use flowscribe_testkit::{FakeRenderer, FakeWorkflow};

use super::*;

/// Memory store whose writes fail for paths containing `needle`.
struct FailingStore {
    inner: MemoryStore,
    needle: String,
}

#[async_trait]
impl Store for FailingStore {
    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        if path.to_string_lossy().contains(&self.needle) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(path, content).await
    }

    async fn read(&self, path: &Path) -> Result<String, StoreError> {
        self.inner.read(path).await
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StoreError> {
        self.inner.ensure_dir(path).await
    }
}

fn config() -> ExtractionConfig {
    ExtractionConfig {
        editor_url: "https://editor.example/app".to_string(),
        timing: TimingConfig::immediate(),
        ..Default::default()
    }
}

fn send_welcome() -> FakeWorkflow {
    FakeWorkflow::new("send-welcome")
        .wf_item("bTGzk")
        .page_text("Backend workflows\nAPI Workflow send-welcome")
        .step(1, "Create a new thing", "Type: User\nEmail: Parameter email")
        .step(2, "Only when condition", "Only when: Current User is logged in")
        .step(3, "Send email", "To: ops@example.com\nSubject: Welcome")
}

struct Harness {
    renderer: Arc<FakeRenderer>,
    snapshots: Arc<SnapshotStore>,
    config: ExtractionConfig,
}

impl Harness {
    fn new(renderer: FakeRenderer) -> Self {
        Self::with_store(renderer, Arc::new(MemoryStore::new()))
    }

    fn with_store(renderer: FakeRenderer, store: Arc<dyn Store>) -> Self {
        Self {
            renderer: Arc::new(renderer),
            snapshots: Arc::new(SnapshotStore::new(store)),
            config: config(),
        }
    }

    async fn run(&self) -> SessionReport {
        self.run_with(Orchestrator::new(self.config.clone())).await
    }

    async fn run_with(&self, mut orchestrator: Orchestrator) -> SessionReport {
        let session =
            ExtractionSession::open(self.renderer.clone(), self.snapshots.clone(), &self.config)
                .await
                .unwrap();
        let report = orchestrator.run(&session).await;
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
        session.close();
        report
    }

    async fn record(&self, report: &SessionReport, name: &str) -> WorkflowRecord {
        let saved = report.saved.iter().find(|w| w.name == name).unwrap();
        self.snapshots.load(&saved.path).await.unwrap()
    }
}

#[tokio::test]
async fn test_three_step_workflow() {
    let harness = Harness::new(FakeRenderer::new(&config()).with_workflow(send_welcome()));
    let report = harness.run().await;

    assert!(!report.was_aborted());
    assert_eq!(report.summary.total_workflows, 1);
    let entry = report.summary.entry("bTGzk").unwrap();
    assert_eq!(entry.status, WorkflowStatus::Complete);
    assert_eq!(entry.steps_count, 3);

    let record = harness.record(&report, "send-welcome").await;
    let actions: Vec<ActionType> = record.steps.iter().map(|s| s.action).collect();
    assert_eq!(
        actions,
        vec![ActionType::CreateThing, ActionType::Condition, ActionType::SendEmail]
    );
    assert_eq!(record.steps[2].properties["subject"], "Welcome");
    assert_eq!(record.url, "https://editor.example/app?tab=BackendWorkflows&wf_item=bTGzk");
    assert!(!record.hash.is_empty());
    assert_eq!(record.version, 1);

    let summary = harness.snapshots.read_summary(&report.summary.session_id).await.unwrap();
    assert_eq!(summary, report.summary);
    assert!(summary.completed_at.is_some());
}

#[tokio::test]
async fn test_step_panel_timeout_marks_partial() {
    let harness = Harness::new(
        FakeRenderer::new(&config()).with_workflow(send_welcome().failing_panel(2, 2)),
    );
    let report = harness.run().await;

    let entry = report.summary.entry("bTGzk").unwrap();
    assert_eq!(entry.status, WorkflowStatus::Partial);
    assert_eq!(entry.incomplete_steps, vec![2]);
    assert_eq!(report.summary.partial_count(), 1);

    let record = harness.record(&report, "send-welcome").await;
    assert_eq!(record.steps.len(), 3);
    assert!(record.steps[1].properties.is_empty());
    assert!(record.steps[1].parameters.is_empty());
    assert!(!record.steps[2].properties.is_empty());
}

#[tokio::test]
async fn test_selection_retried_once() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .with_workflow(FakeWorkflow::new("cleanup").step(1, "Delete thing", "Type: Session"))
            .failing_selection("send-welcome", 1)
            .failing_selection("cleanup", 2),
    );
    let report = harness.run().await;

    assert_eq!(report.summary.workflows.len(), 1);
    assert_eq!(report.summary.workflows[0].name, "send-welcome");
    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped[0].name, "cleanup");
    assert!(report.summary.skipped[0].reason.contains("not clickable"));
}

#[tokio::test]
async fn test_empty_canvas_retried_then_skipped() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome().hidden_steps(1))
            .with_workflow(FakeWorkflow::new("empty").wf_item("e1")),
    );
    let report = harness.run().await;

    assert_eq!(report.summary.workflows.len(), 1);
    assert_eq!(report.summary.workflows[0].steps_count, 3);
    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped[0].wf_item.as_deref(), Some("e1"));
}

#[tokio::test]
async fn test_empty_workflow_saved_when_configured() {
    let mut harness = Harness::new(
        FakeRenderer::new(&config()).with_workflow(FakeWorkflow::new("empty").wf_item("e1")),
    );
    harness.config.save_empty_workflows = true;
    let report = harness.run().await;

    assert!(report.summary.skipped.is_empty());
    let record = harness.record(&report, "empty").await;
    assert!(record.steps.is_empty());
}

#[tokio::test]
async fn test_fatal_error_aborts_but_keeps_saved_work() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .with_workflow(FakeWorkflow::new("doomed").step(1, "Delete thing", "Type: X"))
            .with_workflow(FakeWorkflow::new("never").step(1, "Delete thing", "Type: Y"))
            .fatal_on_select("doomed"),
    );
    let report = harness.run().await;

    assert!(report.was_aborted());
    assert!(report.summary.aborted.as_deref().unwrap().contains("destroyed"));
    assert_eq!(report.summary.total_workflows, 3);
    assert_eq!(report.summary.workflows.len(), 1);
    assert_eq!(harness.renderer.selections(), vec!["send-welcome".to_string()]);

    // The summary is still persisted and the saved snapshot stays readable.
    let summary = harness.snapshots.read_summary(&report.summary.session_id).await.unwrap();
    assert!(summary.aborted.is_some());
    harness.record(&report, "send-welcome").await;
}

#[tokio::test]
async fn test_fatal_screenshot_keeps_saved_workflow_in_summary() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .with_workflow(FakeWorkflow::new("never").step(1, "Delete thing", "Type: Y"))
            .fatal_screenshots(),
    );
    let session = ExtractionSession::open(
        harness.renderer.clone(),
        harness.snapshots.clone(),
        &harness.config,
    )
    .await
    .unwrap()
    .with_screenshot_dir("/tmp/flowscribe-shots");

    let report = Orchestrator::new(harness.config.clone()).run(&session).await;

    assert!(report.summary.aborted.as_deref().unwrap().contains("closed"));
    assert_eq!(report.summary.workflows.len(), 1);
    assert_eq!(report.summary.workflows[0].wf_item, "bTGzk");
    assert_eq!(report.saved.len(), 1);
    assert_eq!(harness.renderer.selections(), vec!["send-welcome".to_string()]);

    let summary = harness.snapshots.read_summary(&report.summary.session_id).await.unwrap();
    assert_eq!(summary.workflows, report.summary.workflows);
    harness.record(&report, "send-welcome").await;
}

#[tokio::test]
async fn test_persistence_failure_is_local() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        needle: "broken".to_string(),
    });
    let harness = Harness::with_store(
        FakeRenderer::new(&config())
            .with_workflow(FakeWorkflow::new("broken-flow").step(1, "Send email", "To: a@b.c"))
            .with_workflow(send_welcome()),
        store,
    );
    let report = harness.run().await;

    assert!(!report.was_aborted());
    assert_eq!(report.summary.failed.len(), 1);
    assert_eq!(report.summary.failed[0].name, "broken-flow");
    assert!(report.summary.failed[0].reason.contains("disk full"));
    assert_eq!(report.summary.workflows.len(), 1);
}

#[tokio::test]
async fn test_cancellation_between_items() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .with_workflow(FakeWorkflow::new("second").step(1, "Delete thing", "Type: X"))
            .on_select(move |name| {
                if name == "send-welcome" {
                    trigger.cancel();
                }
            }),
    );
    let report = harness
        .run_with(Orchestrator::new(config()).with_cancellation(token))
        .await;

    assert_eq!(report.summary.aborted.as_deref(), Some(CANCELLED));
    assert_eq!(report.summary.workflows.len(), 1);
    assert_eq!(report.summary.workflows[0].status, WorkflowStatus::Complete);
    assert_eq!(harness.renderer.selections(), vec!["send-welcome".to_string()]);
}

#[tokio::test]
async fn test_rerun_versions_and_changes() {
    let harness = Harness::new(FakeRenderer::new(&config()).with_workflow(send_welcome()));

    let first = harness.run().await;
    assert_eq!(first.saved[0].changes, None);
    assert_eq!(first.changed().count(), 1);
    let first_record = harness.record(&first, "send-welcome").await;

    let second = harness.run().await;
    let saved = &second.saved[0];
    assert_eq!(saved.version, 1);
    assert!(saved.changes.as_ref().unwrap().is_empty());
    assert!(!saved.is_new_or_changed());
    let second_record = harness.record(&second, "send-welcome").await;
    assert_eq!(first_record.hash, second_record.hash);

    harness
        .renderer
        .set_step_title("send-welcome", 2, "Only when user is admin");
    let third = harness.run().await;
    let saved = &third.saved[0];
    assert_eq!(saved.version, 2);
    let changes = saved.changes.as_ref().unwrap();
    assert_eq!(changes.modified, vec![2]);
    assert!(changes.added.is_empty() && changes.removed.is_empty());
    assert!(changes.hash_changed);
}

#[tokio::test]
async fn test_name_filter_and_limit() {
    let mut harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(FakeWorkflow::new("user-signup").step(1, "Sign the user up", "Email: x"))
            .with_workflow(FakeWorkflow::new("cleanup").step(1, "Delete thing", "Type: X"))
            .with_workflow(FakeWorkflow::new("user-login").step(1, "Log the user in", "Email: y"))
            .with_workflow(FakeWorkflow::new("user-logout").step(1, "Log the user out", "")),
    );
    harness.config.name_filter = Some("user-".to_string());
    harness.config.max_workflows = Some(2);
    let report = harness.run().await;

    assert_eq!(report.summary.total_workflows, 4);
    assert_eq!(
        harness.renderer.selections(),
        vec!["user-signup".to_string(), "user-login".to_string()]
    );
}

#[tokio::test]
async fn test_wf_item_falls_back_to_name() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(FakeWorkflow::new("nightly report!").step(1, "Send email", "To: x")),
    );
    let report = harness.run().await;

    assert_eq!(report.summary.workflows[0].wf_item, "nightlyreport");
    assert_eq!(report.saved[0].workflow_id, "nightlyreport");
}

#[tokio::test]
async fn test_workflow_metadata_from_panel_and_page() {
    let harness = Harness::new(
        FakeRenderer::new(&config()).with_workflow(
            send_welcome().workflow_panel("Endpoint name: send-welcome\nParameter user: User"),
        ),
    );
    let report = harness.run().await;

    let record = harness.record(&report, "send-welcome").await;
    assert_eq!(
        record.metadata.trigger.trigger_type,
        Some(flowscribe_protocols::TriggerType::ApiWorkflow)
    );
    assert_eq!(record.metadata.properties["endpoint_name"], "send-welcome");
    assert_eq!(record.interface.inputs.len(), 1);
    assert_eq!(record.interface.inputs[0].value, "User");
}

#[tokio::test]
async fn test_screenshot_failure_does_not_fail_workflow() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .failing_screenshots(),
    );
    let session = ExtractionSession::open(
        harness.renderer.clone(),
        harness.snapshots.clone(),
        &harness.config,
    )
    .await
    .unwrap()
    .with_screenshot_dir("/tmp/flowscribe-shots");

    let report = Orchestrator::new(harness.config.clone()).run(&session).await;
    assert_eq!(report.summary.workflows.len(), 1);
    assert!(harness.renderer.screenshots().is_empty());
}

#[tokio::test]
async fn test_screenshot_path_per_workflow() {
    let harness = Harness::new(FakeRenderer::new(&config()).with_workflow(send_welcome()));
    let session = ExtractionSession::open(
        harness.renderer.clone(),
        harness.snapshots.clone(),
        &harness.config,
    )
    .await
    .unwrap()
    .with_screenshot_dir("/tmp/flowscribe-shots");

    Orchestrator::new(harness.config.clone()).run(&session).await;
    assert_eq!(
        harness.renderer.screenshots(),
        vec![PathBuf::from("/tmp/flowscribe-shots/send-welcome_bTGzk.png")]
    );
}

#[tokio::test]
async fn test_empty_navigation_list() {
    let harness = Harness::new(FakeRenderer::new(&config()));
    let report = harness.run().await;

    assert!(!report.was_aborted());
    assert_eq!(report.summary.total_workflows, 0);
    assert!(report.summary_path.is_some());
}

#[tokio::test]
async fn test_navigation_read_retried_once() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .failing_nav_reads(1),
    );
    let report = harness.run().await;

    assert!(!report.was_aborted());
    assert_eq!(report.summary.total_workflows, 1);
    assert_eq!(report.summary.workflows.len(), 1);
}

#[tokio::test]
async fn test_unreadable_navigation_is_not_fatal() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(send_welcome())
            .failing_nav_reads(10),
    );
    let report = harness.run().await;

    assert!(!report.was_aborted());
    assert_eq!(report.summary.total_workflows, 0);
    assert!(harness.renderer.selections().is_empty());
    assert!(report.summary_path.is_some());
}

#[tokio::test]
async fn test_colliding_workflow_ids_version_independently() {
    let harness = Harness::new(
        FakeRenderer::new(&config())
            .with_workflow(
                FakeWorkflow::new("send welcome")
                    .wf_item("aaa")
                    .step(1, "Send email", "To: a@example.com"),
            )
            .with_workflow(
                FakeWorkflow::new("sendwelcome")
                    .wf_item("bbb")
                    .step(1, "Create a new thing", "Type: User")
                    .step(2, "Delete thing", "Type: User"),
            ),
    );

    let first = harness.run().await;
    assert_eq!(first.saved.len(), 2);
    assert_eq!(first.saved[0].workflow_id, first.saved[1].workflow_id);

    let second = harness.run().await;
    assert_eq!(second.saved.len(), 2);
    for saved in &second.saved {
        assert_eq!(saved.version, 1, "{}", saved.name);
        assert!(saved.changes.as_ref().unwrap().is_empty(), "{}", saved.name);
    }
}

#[test]
fn test_wf_item_from_url() {
    assert_eq!(
        wf_item_from_url("https://editor.example/app?tab=BackendWorkflows&wf_item=bTGzk"),
        Some("bTGzk".to_string())
    );
    assert_eq!(wf_item_from_url("https://editor.example/app?wf_item="), None);
    assert_eq!(wf_item_from_url("https://editor.example/app"), None);
    assert_eq!(wf_item_from_url("not a url"), None);
}
