//! flowscribe - workflow editor extraction CLI.

use std::path::Path;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use flowscribe_config::{Config, ConfigLoader, LoggingConfig};

mod cli;
mod cmd_check;
mod cmd_diff;
mod cmd_extract;

use cli::{Cli, Commands};

/// Initialize console output plus an optional daily-rotated log file.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("flowscribe")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes the file writer on drop; keep it for the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(logging.ansi))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(ConfigLoader::load_or_default(path)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Extract {
            editor_url,
            filter,
            max_workflows,
            screenshots,
            output,
        } => {
            let overrides = cmd_extract::Overrides {
                editor_url,
                name_filter: filter,
                max_workflows,
                screenshots,
                output,
            };
            cmd_extract::run(overrides.apply(config)).await
        }
        Commands::Diff { old, new } => cmd_diff::run(&old, &new).await,
        Commands::CheckConfig => cmd_check::run(&cli.config, &config),
    }
}
