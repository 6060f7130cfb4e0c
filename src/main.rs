//! clan-war-archiver entry point.
//!
//! Opens the archive, starts the polling scheduler and serves the REST API
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use chrono::TimeDelta;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use clan_war_archiver::api;
use clan_war_archiver::app_state::AppState;
use clan_war_archiver::config::ArchiverConfig;
use clan_war_archiver::notify::{LogNotifier, Notifier, TelegramNotifier};
use clan_war_archiver::persistence::SqliteArchive;
use clan_war_archiver::service::{ArchiverSettings, Scheduler, WarArchiver};
use clan_war_archiver::source::{CocApiClient, SnapshotSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ArchiverConfig::from_env().context("loading configuration")?;
    tracing::info!(clan = %config.clan_tag, addr = %config.listen_addr, "starting clan-war-archiver");

    // Open the archive
    let archive = SqliteArchive::connect(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_connect_timeout_secs),
    )
    .await
    .context("opening the war archive")?;
    archive.migrate().await.context("migrating the war archive")?;

    // Build the pipeline
    let source: Arc<dyn SnapshotSource> = Arc::new(
        CocApiClient::new(
            &config.coc_api_base_url,
            config.coc_api_token.clone(),
            config.source_timeout(),
        )
        .context("building the Clash of Clans client")?,
    );
    let notifier: Arc<dyn Notifier> = match &config.telegram_bot_token {
        Some(token) => Arc::new(
            TelegramNotifier::new(token, config.source_timeout())
                .context("building the Telegram client")?,
        ),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; alerts are only logged");
            Arc::new(LogNotifier)
        }
    };
    let alert_lead = TimeDelta::try_seconds(i64::try_from(config.pre_war_alert_lead_secs)?)
        .context("PRE_WAR_ALERT_LEAD_SECS out of range")?;
    let archiver = Arc::new(WarArchiver::new(
        source,
        notifier,
        archive.clone(),
        ArchiverSettings {
            clan_tag: config.clan_tag.clone(),
            alert_lead,
            source_timeout: config.source_timeout(),
            donation_every_hours: config.donation_snapshot_every_hours,
        },
    ));

    // Start the scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        archiver,
        config.poll_interval(),
        config.poll_initial_delay(),
    );
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(archive));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scheduler; a tick in flight is allowed to finish
    shutdown_tx.send_replace(true);
    if let Err(e) = scheduler_task.await {
        tracing::error!(error = %e, "scheduler task failed");
    }
    tracing::info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
