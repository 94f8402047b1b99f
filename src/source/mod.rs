//! Upstream room feed: the port the snapshot store polls, and its HTTP
//! adapter.

pub mod http;

use std::future::Future;

use crate::domain::Room;

pub use http::{HttpRoomSource, parse_rooms};

/// Failure to obtain a fresh room collection.
///
/// Always recovered locally: the store keeps the previous snapshot and the
/// next scheduled poll retries.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("room feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("room feed returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        message: String,
    },

    /// The body was not the expected room collection.
    #[error("room feed payload is malformed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Source-specific failure not covered above.
    #[error("room feed unavailable: {0}")]
    Unavailable(String),
}

/// Produces the full current room collection.
pub trait RoomSource: Send + Sync {
    /// Fetches every online room.
    fn fetch_rooms(&self) -> impl Future<Output = Result<Vec<Room>, FetchError>> + Send;
}

impl<T: RoomSource> RoomSource for std::sync::Arc<T> {
    fn fetch_rooms(&self) -> impl Future<Output = Result<Vec<Room>, FetchError>> + Send {
        (**self).fetch_rooms()
    }
}
