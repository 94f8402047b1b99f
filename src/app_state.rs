//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::EventBus;
use crate::service::WatchHandle;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client of the watch engine.
    pub watch: WatchHandle,
    /// Event bus for SSE subscriptions.
    pub event_bus: EventBus,
    /// Base URL of room join deep links.
    pub join_url_base: Arc<str>,
    /// Cancelled when the service shuts down; ends open SSE streams.
    pub shutdown: CancellationToken,
}
