//! `flowscribe extract`: one extraction session against the live editor.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use flowscribe_config::{Config, ConfigValidator};
use flowscribe_renderer_cdp::CdpRenderer;
use flowscribe_runtime::{CANCELLED, ExtractionSession, Orchestrator, SessionReport};
use flowscribe_snapshot::{FsStore, SnapshotStore};

/// Command-line values that take precedence over the config file.
pub(crate) struct Overrides {
    pub editor_url: Option<String>,
    pub name_filter: Option<String>,
    pub max_workflows: Option<usize>,
    pub screenshots: bool,
    pub output: Option<PathBuf>,
}

impl Overrides {
    pub(crate) fn apply(self, mut config: Config) -> Config {
        if let Some(url) = self.editor_url {
            config.extraction.editor_url = url;
        }
        if self.name_filter.is_some() {
            config.extraction.name_filter = self.name_filter;
        }
        if self.max_workflows.is_some() {
            config.extraction.max_workflows = self.max_workflows;
        }
        if self.screenshots {
            config.extraction.screenshots = true;
        }
        if let Some(output) = self.output {
            config.output.root_dir = output;
        }
        config
    }
}

pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    for warning in ConfigValidator::validate_for_extraction(&config).into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    info!("Starting flowscribe v{}", env!("CARGO_PKG_VERSION"));
    info!("Snapshot root: {}", config.output.root_dir.display());

    let store = FsStore::new(config.output.root_dir.clone()).await?;
    let snapshots = Arc::new(SnapshotStore::new(Arc::new(store)));
    let renderer = Arc::new(CdpRenderer::connect(&config.renderer).await?);

    let mut session = ExtractionSession::open(renderer, snapshots, &config.extraction).await?;
    if config.extraction.screenshots {
        let dir = config.output.root_dir.join(session.id()).join("screenshots");
        session = session.with_screenshot_dir(dir);
    }

    let mut orchestrator = Orchestrator::new(config.extraction.clone());
    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current workflow");
            token.cancel();
        }
    });

    let report = orchestrator.run(&session).await;
    session.close();

    print_report(&config, &report);

    match report.summary.aborted.as_deref() {
        None | Some(CANCELLED) => Ok(()),
        Some(reason) => {
            error!("Session aborted: {}", reason);
            Err(format!("session aborted: {}", reason).into())
        }
    }
}

fn print_report(config: &Config, report: &SessionReport) {
    let summary = &report.summary;
    println!(
        "Session {}: {} found, {} saved ({} partial), {} skipped, {} failed",
        summary.session_id,
        summary.total_workflows,
        summary.workflows.len(),
        summary.partial_count(),
        summary.skipped.len(),
        summary.failed.len(),
    );

    for saved in report.changed() {
        let what = match &saved.changes {
            None => "new".to_string(),
            Some(changes) => format!(
                "v{}: +{} -{} ~{}",
                saved.version,
                changes.added.len(),
                changes.removed.len(),
                changes.modified.len()
            ),
        };
        println!("  {} ({})", saved.name, what);
    }

    for issue in summary.skipped.iter().chain(&summary.failed) {
        println!("  ! {}: {}", issue.name, issue.reason);
    }

    if let Some(path) = &report.summary_path {
        println!("Summary: {}", config.output.root_dir.join(path).display());
    }
}
