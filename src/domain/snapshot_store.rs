//! Holder of the latest polled room collection.
//!
//! [`RoomSnapshotStore`] keeps the most recent successful [`Snapshot`]
//! behind an [`Arc`] so readers can hold on to it cheaply while the next
//! poll swaps a new one in. A failed poll never touches the held snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Room, Snapshot};
use crate::source::{FetchError, RoomSource};

/// Last refresh failure, kept for status reporting.
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    /// Rendered error message.
    pub message: String,
    /// When the failure was observed.
    pub at: DateTime<Utc>,
}

/// Latest room snapshot plus refresh bookkeeping.
#[derive(Debug, Default)]
pub struct RoomSnapshotStore {
    snapshot: Arc<Snapshot>,
    last_failure: Option<RefreshFailure>,
}

impl RoomSnapshotStore {
    /// Creates a store holding the empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches from `source` and applies the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] reported by the source; the previous
    /// snapshot is retained.
    pub async fn refresh<S: RoomSource>(&mut self, source: &S) -> Result<Arc<Snapshot>, FetchError> {
        let result = source.fetch_rooms().await;
        self.apply(result)
    }

    /// Applies the outcome of a fetch that ran elsewhere.
    ///
    /// On success the held snapshot is replaced wholesale. On failure it is
    /// left untouched and the error is logged and returned.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] passed in.
    pub fn apply(
        &mut self,
        result: Result<Vec<Room>, FetchError>,
    ) -> Result<Arc<Snapshot>, FetchError> {
        match result {
            Ok(rooms) => {
                let snapshot = Arc::new(Snapshot::new(rooms, Utc::now()));
                tracing::debug!(rooms = snapshot.len(), "room snapshot replaced");
                self.snapshot = Arc::clone(&snapshot);
                self.last_failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    stale_since = ?self.snapshot.fetched_at(),
                    "room refresh failed; keeping previous snapshot"
                );
                self.last_failure = Some(RefreshFailure {
                    message: e.to_string(),
                    at: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Looks up a room in the current snapshot.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Room> {
        self.snapshot.get_by_id(id)
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Failure of the most recent refresh, cleared by the next success.
    #[must_use]
    pub fn last_failure(&self) -> Option<&RefreshFailure> {
        self.last_failure.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::fixtures::room;

    /// Returns queued results in order, then errors.
    struct QueuedSource(Mutex<Vec<Result<Vec<Room>, FetchError>>>);

    impl QueuedSource {
        fn new(mut results: Vec<Result<Vec<Room>, FetchError>>) -> Self {
            results.reverse();
            Self(Mutex::new(results))
        }
    }

    impl RoomSource for QueuedSource {
        async fn fetch_rooms(&self) -> Result<Vec<Room>, FetchError> {
            let next = self.0.lock().ok().and_then(|mut queue| queue.pop());
            next.unwrap_or_else(|| Err(FetchError::Unavailable("queue drained".to_string())))
        }
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let source = QueuedSource::new(vec![Ok(vec![room("r1", 6)]), Ok(vec![room("r2", 1)])]);
        let mut store = RoomSnapshotStore::new();

        let Ok(first) = store.refresh(&source).await else {
            panic!("first refresh should succeed");
        };
        assert!(first.get_by_id("r1").is_some());

        let Ok(_) = store.refresh(&source).await else {
            panic!("second refresh should succeed");
        };
        assert!(store.get_by_id("r1").is_none());
        assert!(store.get_by_id("r2").is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = QueuedSource::new(vec![Ok(vec![room("r1", 6)])]);
        let mut store = RoomSnapshotStore::new();
        let _ = store.refresh(&source).await;
        let before = Arc::clone(store.snapshot());

        let result = store.refresh(&source).await;
        assert!(result.is_err());
        assert!(Arc::ptr_eq(&before, store.snapshot()));
        assert!(store.get_by_id("r1").is_some());
        assert!(store.last_failure().is_some());
    }

    #[test]
    fn success_clears_last_failure() {
        let mut store = RoomSnapshotStore::new();
        let _ = store.apply(Err(FetchError::Unavailable("down".to_string())));
        assert!(store.last_failure().is_some());
        assert!(store.snapshot().fetched_at().is_none());

        let _ = store.apply(Ok(vec![room("r1", 2)]));
        assert!(store.last_failure().is_none());
        assert!(store.snapshot().fetched_at().is_some());
    }
}
