//! Server-Sent Events stream of watch events.

use std::convert::Infallible;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::domain::WatchEvent;

const FORWARD_BUFFER: usize = 16;

/// `GET /events` — SSE stream of watch events.
///
/// Each event is sent as a JSON `data:` frame with the event type as the
/// SSE event name. The stream ends when the client disconnects or the
/// service shuts down.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Stream watch events",
    description = "Server-Sent Events stream of watch additions, removals, firings and snapshot refreshes.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = WatchEvent),
    )
)]
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(FORWARD_BUFFER);
    tokio::spawn(forward(
        state.event_bus.subscribe(),
        tx,
        state.shutdown.clone(),
    ));

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

/// Copies bus events into one SSE connection until cancelled, the client
/// goes away, or the bus closes.
async fn forward(
    mut events: broadcast::Receiver<WatchEvent>,
    tx: mpsc::Sender<Result<Event, Infallible>>,
    shutdown: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            () = tx.closed() => break,
            received = events.recv() => received,
        };

        match received {
            Ok(event) => {
                let Some(frame) = to_sse(&event) else {
                    continue;
                };
                if tx.send(Ok(frame)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn to_sse(event: &WatchEvent) -> Option<Event> {
    match Event::default()
        .event(event.event_type_str())
        .json_data(event)
    {
        Ok(sse) => Some(sse),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize watch event for SSE stream");
            None
        }
    }
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(stream))
}
