//! Cadence Daemon - Main Entry Point
//! Drains logged interactions through the follow-up processor and sweeps
//! overdue follow-ups on a schedule.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cadence_core::application::followup::{AfcAdvancer, FollowUpCycle, FollowUpProcessor};
use cadence_core::application::worker::{shutdown_channel, InteractionWorker};
use cadence_core::application::AdvancerScheduler;
use cadence_core::port::id_provider::UuidProvider;
use cadence_core::port::time_provider::SystemTimeProvider;
use cadence_infra_sqlite::{
    create_pool, run_migrations, SqliteFollowUpStore, SqliteInteractionRepository,
    SqliteLeadRepository, SqliteTaskRepository,
};
use config::{DaemonConfig, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install the global subscriber. The returned guard flushes the file log on drop.
fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("cadence=info"))
        .context("Failed to create env filter")?;

    let stdout_layer = match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cadence-daemon.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (otel_layer, otel_warning) = telemetry::otel_layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .with(otel_layer)
        .init();

    if let Some(warning) = otel_warning {
        tracing::warn!("{}", warning);
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration and initialize logging
    let config = DaemonConfig::from_env();
    let _log_guard = init_logging(&config)?;

    info!("Cadence daemon v{} starting...", VERSION);
    info!(db_path = %config.db_path, "Initializing database...");

    // 2. Initialize database
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !config.db_path.starts_with("sqlite:") && !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let pool = create_pool(&config.database_url())
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let leads = Arc::new(SqliteLeadRepository::new(pool.clone()));
    let tasks = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let interactions = Arc::new(SqliteInteractionRepository::new(pool.clone()));
    let followups = Arc::new(SqliteFollowUpStore::new(pool.clone()));

    let cycle = FollowUpCycle::new(
        leads,
        tasks,
        interactions.clone(),
        id_provider,
        time_provider.clone(),
    );

    // 4. Start interaction worker
    info!(batch = config.poll_batch, "Starting interaction worker...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let worker = InteractionWorker::new(
        interactions,
        Arc::new(FollowUpProcessor::new(cycle.clone(), followups)),
        time_provider,
    )
    .with_batch(config.poll_batch);

    let worker_shutdown = shutdown_rx.clone();
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(worker_shutdown).await {
            tracing::error!(error = ?e, "Worker failed");
        }
    });

    // 5. Start overdue sweep scheduler
    info!(
        interval_hours = config.advance_interval_hours,
        "Starting advancer scheduler..."
    );
    let scheduler = AdvancerScheduler::new(
        Arc::new(AfcAdvancer::new(cycle)),
        config.advance_interval_hours,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    info!("✅ System ready. Waiting for interactions...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, worker_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_handle).await;
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
