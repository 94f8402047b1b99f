//! roomwatch server entry point.
//!
//! Starts the room poller, the watch engine and the Axum HTTP server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomwatch::api;
use roomwatch::app_state::AppState;
use roomwatch::config::{LogFormat, NotifierKind, RoomwatchConfig};
use roomwatch::domain::EventBus;
use roomwatch::notify::{DesktopNotifier, LogNotifier, NotificationGateway, Notifier, Permission};
use roomwatch::service::{RuntimeConfig, WatchEngine, WatchRuntime};
use roomwatch::source::HttpRoomSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config =
        RoomwatchConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        rooms_url = %config.rooms_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        "starting roomwatch"
    );

    let shutdown = CancellationToken::new();

    // Notification gateway, asked for permission once
    let notifier = match config.notifier {
        NotifierKind::Log => Notifier::Log(LogNotifier::new()),
        NotifierKind::Desktop => Notifier::Desktop(DesktopNotifier::new(
            config.notify_icon.clone(),
            config.notify_focus_command.clone(),
        )
        .with_shutdown(shutdown.clone())),
    };
    match notifier.ensure_permission().await {
        Permission::Granted => tracing::info!("notification permission granted"),
        permission => {
            tracing::warn!(
                ?permission,
                "notifications are disabled, watches will be consumed silently"
            );
        }
    }

    // Engine and poller
    let event_bus = EventBus::new(config.event_bus_capacity);
    let engine = WatchEngine::new(notifier, event_bus.clone());
    let source = HttpRoomSource::new(config.rooms_url.clone());
    let runtime = WatchRuntime::spawn(
        engine,
        source,
        RuntimeConfig {
            poll_interval: config.poll_interval,
            command_capacity: config.command_channel_capacity,
        },
        shutdown.child_token(),
    );

    // Build application state
    let app_state = AppState {
        watch: runtime.handle(),
        event_bus,
        join_url_base: Arc::from(config.join_url_base.as_str()),
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        tracing::error!(%err, "failed to listen for ctrl-c");
                    }
                }
                () = signal_token.cancelled() => {}
            }
            tracing::info!("shutting down");
            signal_token.cancel();
        })
        .await
        .context("server error")?;

    let engine = runtime.shutdown().await?;
    tracing::info!(
        pending_watches = engine.registry().len(),
        "watch engine stopped"
    );

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
