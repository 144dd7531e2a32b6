//! `soundwatch` -- sound-level monitor daemon.
//!
//! Samples the default ALSA capture device in a loop and emails a warning
//! when the level drops below the configured threshold, when acquisition
//! fails, or when the host runs on battery. A heartbeat with a chart of
//! the cycle goes out at the end of every monitoring cycle.
//!
//! Configuration comes from command-line flags with environment fallbacks
//! (see `soundwatch --help`); a `.env` file is loaded first. Set
//! `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to override the
//! default filter.

use std::time::Duration;

use soundwatch_agent::artifacts::ArtifactStore;
use soundwatch_agent::cli::Cli;
use soundwatch_agent::monitor::MonitorLoop;
use soundwatch_agent::power::SysfsPowerStatus;
use soundwatch_agent::source::ArecordSource;
use soundwatch_core::{MonitorConfig, SystemClock};
use soundwatch_events::{dispatch, SmtpNotifier};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time the dispatcher gets to drain queued notifications on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = cli.settings().validate().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        threshold = config.threshold,
        rate = config.sampling_rate,
        seconds = config.sample_window_secs,
        cadence = ?config.cadence(),
        cool_down_secs = config.cool_down.as_secs(),
        recipients = config.recipients.len(),
        "Starting soundwatch",
    );

    if let Err(e) = run(config, &cli).await {
        tracing::error!(error = %e, "soundwatch failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "soundwatch_agent=info,soundwatch_events=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(config: MonitorConfig, cli: &Cli) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.tmp_dir)
        .await
        .with_context(|| format!("creating tmp dir {}", config.tmp_dir.display()))?;
    let artifacts = ArtifactStore::from_config(&config);
    artifacts
        .prepare()
        .await
        .context("creating artifact dir")?;

    let notifier = SmtpNotifier::new(cli.email_config());
    let (queue, dispatcher) =
        dispatch::channel(notifier, config.queue_capacity, config.delivery_timeout);
    let dispatcher = tokio::spawn(dispatcher.run());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let source = ArecordSource::new(&config);
    let report = MonitorLoop::new(
        config,
        source,
        SysfsPowerStatus::default(),
        SystemClock,
        artifacts,
        queue,
    )
    .run(cancel)
    .await;
    tracing::info!(
        ticks = report.ticks,
        cycles = report.cycles,
        notifications = report.notifications,
        "Monitor loop finished"
    );

    match tokio::time::timeout(DRAIN_TIMEOUT, dispatcher).await {
        Ok(Ok(stats)) => {
            tracing::info!(
                delivered = stats.delivered,
                failed = stats.failed,
                "Dispatcher drained"
            );
        }
        Ok(Err(e)) => tracing::error!(error = %e, "Dispatcher task failed"),
        Err(_) => tracing::warn!("Dispatcher did not drain in time, pending notifications dropped"),
    }

    tracing::info!("soundwatch shut down");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
