//! release-watch entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `release-watch.toml` plus `RELEASE_WATCH_*`
//!    overrides and validate them.
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON or
//!    pretty layer and, when an endpoint is configured, an OTLP span exporter.
//! 3. **Construct infrastructure**: create the provider client, the messaging
//!    client and the state store, and inject them into [`ChangeNotifier`].
//! 4. **Select trigger mode**:
//!    - `run-once`: run a single cycle and exit (non-zero if any app failed).
//!    - `watch`: run a cycle at every cron tick until interrupted.
//!    - `token`: print a freshly signed provider token.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use appstore::{ClientConfig, Credential, ReleaseStatusClient, TokenSigner};
use clap::{Parser, Subcommand};
use kv_store::FileStore;
use notifier::{ChangeNotifier, CycleMode, NotifierConfig};
use scheduler::CronTrigger;
use slack::{SlackClient, SlackConfig};
use tracing::{info, warn};
use tracker::{StatusView, TrackedApplication};

use crate::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(name = "release-watch", version, about = "Posts store release status changes to a chat channel")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one polling cycle and exit.
    RunOnce {
        /// Post the current status of every app even if nothing changed.
        #[arg(long)]
        force: bool,
    },
    /// Run polling cycles on the configured schedule.
    Watch,
    /// Print a signed provider token.
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::extract(&cli.config)
        .with_context(|| format!("failed to read {}", cli.config.display()))?;

    if let Command::Token = cli.command {
        config.validate_app_store()?;
        let token = TokenSigner::new().sign(&credential(&config))?;
        println!("{}", token.as_str());
        return Ok(());
    }

    config.validate()?;
    let providers = telemetry::init_telemetry(&config.logging)?;
    let result = run(cli.command, &config).await;
    telemetry::shutdown_telemetry(providers);
    result
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let apps = config.tracked_apps()?;
    let notifier = build_notifier(config)?;
    info!(apps = apps.len(), "release-watch started");

    match command {
        Command::RunOnce { force } => {
            let mode = if force {
                CycleMode::Always
            } else {
                CycleMode::OnChange
            };
            let report = notifier.run_cycle(&apps, mode).await;
            let counts = report.counts();
            if counts.failed > 0 {
                anyhow::bail!(
                    "{} of {} applications reported errors",
                    counts.failed,
                    report.reports.len()
                );
            }
            Ok(())
        }
        Command::Watch => watch(config, &notifier, &apps).await,
        Command::Token => Ok(()),
    }
}

async fn watch(config: &Config, notifier: &ChangeNotifier, apps: &[TrackedApplication]) -> Result<()> {
    let trigger = CronTrigger::new(&config.schedule.cron, config.schedule_offset()?)?;
    let ticks = trigger
        .run(
            move |_| async move {
                notifier.run_cycle(apps, CycleMode::OnChange).await;
            },
            shutdown_signal(),
        )
        .await;
    info!(ticks, "release-watch stopped");
    Ok(())
}

fn credential(config: &Config) -> Credential {
    Credential::new(
        config.app_store.key_id.trim(),
        config.app_store.issuer_id.trim(),
        config.app_store.private_key.expose(),
    )
}

fn build_notifier(config: &Config) -> Result<ChangeNotifier> {
    let source = ReleaseStatusClient::new(
        credential(config),
        ClientConfig {
            base_url: config.app_store.base_url.clone(),
            timeout: Duration::from_secs(config.app_store.timeout_secs),
        },
    )?;
    let sink = SlackClient::new(
        config.slack.bot_token.expose(),
        SlackConfig {
            base_url: config.slack.base_url.clone(),
            ..SlackConfig::default()
        },
    )?;
    let store = FileStore::new(&config.storage.directory);

    Ok(ChangeNotifier::new(
        Arc::new(source),
        Arc::new(sink),
        Arc::new(store),
        NotifierConfig {
            channel: config.channel()?,
            max_concurrency: config.notifier.max_concurrency,
            view: StatusView::new(config.display_offset()?),
        },
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown requested");
}
