//! Watch engine: single owner of the snapshot store, the watch registry and
//! the notification gateway.
//!
//! Every mutation that changes the snapshot or the watch set is followed by
//! a reconciliation pass, so a watch added for a room that already has a
//! free slot fires immediately instead of waiting for the next poll.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    EventBus, FiredWatch, Room, RoomId, RoomSnapshotStore, Snapshot, ToggleOutcome, WatchEvent,
    WatchRegistry,
};
use crate::error::WatchError;
use crate::notify::{NotificationGateway, Permission};
use crate::source::FetchError;

/// Point-in-time view of engine health.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EngineStatus {
    /// Rooms in the current snapshot.
    pub room_count: usize,
    /// Active watches.
    pub watch_count: usize,
    /// Fetch instant of the current snapshot.
    pub snapshot_fetched_at: Option<DateTime<Utc>>,
    /// Error of the most recent refresh, if it failed.
    pub last_refresh_error: Option<String>,
    /// When the most recent refresh failed.
    pub last_refresh_error_at: Option<DateTime<Utc>>,
    /// Notification permission state.
    pub notification_permission: Permission,
}

/// Current snapshot together with the watched ids.
#[derive(Debug, Clone)]
pub struct RoomsView {
    /// Current snapshot.
    pub snapshot: Arc<Snapshot>,
    /// Watched ids, sorted.
    pub watched: Vec<RoomId>,
}

impl RoomsView {
    /// Returns `true` if `id` is watched.
    #[must_use]
    pub fn is_watched(&self, id: &str) -> bool {
        self.watched
            .binary_search_by(|probe| probe.as_str().cmp(id))
            .is_ok()
    }

    /// Looks up a room in the snapshot.
    #[must_use]
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.snapshot.get_by_id(id)
    }
}

/// Owns all watch state and performs every transition on it.
#[derive(Debug)]
pub struct WatchEngine<N> {
    store: RoomSnapshotStore,
    registry: WatchRegistry,
    gateway: N,
    event_bus: EventBus,
}

impl<N: NotificationGateway> WatchEngine<N> {
    /// Creates an engine with an empty snapshot and no watches.
    #[must_use]
    pub fn new(gateway: N, event_bus: EventBus) -> Self {
        Self {
            store: RoomSnapshotStore::new(),
            registry: WatchRegistry::new(),
            gateway,
            event_bus,
        }
    }

    /// Notification gateway.
    #[must_use]
    pub fn gateway(&self) -> &N {
        &self.gateway
    }

    /// Snapshot store.
    #[must_use]
    pub fn store(&self) -> &RoomSnapshotStore {
        &self.store
    }

    /// Watch registry.
    #[must_use]
    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Starts watching `id`, then reconciles if the set changed.
    ///
    /// Returns `true` if the id was newly added.
    pub fn subscribe(&mut self, id: RoomId) -> bool {
        if !self.registry.subscribe(id.clone()) {
            return false;
        }
        tracing::info!(room_id = %id, "watch added");
        self.event_bus.publish(WatchEvent::WatchAdded {
            room_id: id,
            timestamp: Utc::now(),
        });
        self.reconcile();
        true
    }

    /// Stops watching `id`, then reconciles if the set changed.
    ///
    /// Returns `true` if the id was watched.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        if !self.registry.unsubscribe(id) {
            return false;
        }
        tracing::info!(room_id = %id, "watch removed");
        self.event_bus.publish(WatchEvent::WatchRemoved {
            room_id: RoomId::new(id),
            timestamp: Utc::now(),
        });
        self.reconcile();
        true
    }

    /// Flips the watch on `id` without any precondition.
    pub fn toggle(&mut self, id: RoomId) -> ToggleOutcome {
        if self.registry.contains(id.as_str()) {
            self.unsubscribe(id.as_str());
            ToggleOutcome::Unsubscribed
        } else {
            self.subscribe(id);
            ToggleOutcome::Subscribed
        }
    }

    /// Flips the watch on `id` as requested from the interactive surface.
    ///
    /// Removing a watch is always allowed. Adding one requires the room to
    /// be present and full in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RoomNotFound`] if the room is not in the
    /// snapshot, or [`WatchError::RoomNotFull`] if it has a free slot.
    pub fn request_toggle(&mut self, id: RoomId) -> Result<ToggleOutcome, WatchError> {
        if !self.registry.contains(id.as_str()) {
            match self.store.get_by_id(id.as_str()) {
                None => return Err(WatchError::RoomNotFound(id)),
                Some(room) if !room.is_full() => return Err(WatchError::RoomNotFull(id)),
                Some(_) => {}
            }
        }
        Ok(self.toggle(id))
    }

    /// Applies the outcome of a fetch.
    ///
    /// A success replaces the snapshot and reconciles. A failure keeps the
    /// previous snapshot and does not reconcile.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] passed in.
    pub fn apply_refresh(
        &mut self,
        result: Result<Vec<Room>, FetchError>,
    ) -> Result<Arc<Snapshot>, FetchError> {
        match self.store.apply(result) {
            Ok(snapshot) => {
                self.event_bus.publish(WatchEvent::SnapshotRefreshed {
                    room_count: snapshot.len(),
                    timestamp: snapshot.fetched_at().unwrap_or_else(Utc::now),
                });
                self.reconcile();
                Ok(snapshot)
            }
            Err(e) => {
                self.event_bus.publish(WatchEvent::RefreshFailed {
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Fires and drops every watch whose room has a free slot.
    pub fn reconcile(&mut self) -> Vec<FiredWatch> {
        if self.registry.is_empty() {
            return Vec::new();
        }
        let snapshot = Arc::clone(self.store.snapshot());
        let fired = self.registry.reconcile(&snapshot, &self.gateway);
        for watch in &fired {
            self.event_bus.publish(WatchEvent::from(watch));
        }
        fired
    }

    /// Current snapshot and watched ids.
    #[must_use]
    pub fn rooms_view(&self) -> RoomsView {
        RoomsView {
            snapshot: Arc::clone(self.store.snapshot()),
            watched: self.registry.ids(),
        }
    }

    /// Health summary.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let failure = self.store.last_failure();
        EngineStatus {
            room_count: self.store.snapshot().len(),
            watch_count: self.registry.len(),
            snapshot_fetched_at: self.store.snapshot().fetched_at(),
            last_refresh_error: failure.map(|f| f.message.clone()),
            last_refresh_error_at: failure.map(|f| f.at),
            notification_permission: self.gateway.permission(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::fixtures::room;
    use crate::notify::MemoryNotifier;

    fn engine() -> (WatchEngine<Arc<MemoryNotifier>>, Arc<MemoryNotifier>, EventBus) {
        let gateway = Arc::new(MemoryNotifier::granted());
        let bus = EventBus::new(64);
        (WatchEngine::new(Arc::clone(&gateway), bus.clone()), gateway, bus)
    }

    #[test]
    fn full_room_then_freed_fires_once() {
        let (mut engine, gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("r1", 6)]));
        assert!(engine.subscribe(RoomId::new("r1")));
        assert_eq!(gateway.fired_count(), 0);

        let _ = engine.apply_refresh(Ok(vec![room("r1", 5)]));
        assert_eq!(gateway.fired_count(), 1);
        assert!(!engine.registry().contains("r1"));

        let _ = engine.apply_refresh(Ok(vec![room("r1", 5)]));
        assert!(engine.reconcile().is_empty());
        assert_eq!(gateway.fired_count(), 1);
    }

    #[test]
    fn subscribing_to_free_room_fires_without_new_snapshot() {
        let (mut engine, gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("r1", 4)]));

        engine.subscribe(RoomId::new("r1"));
        assert_eq!(gateway.fired_count(), 1);
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn failed_refresh_keeps_watches_and_does_not_fire() {
        let (mut engine, gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("r1", 6)]));
        engine.subscribe(RoomId::new("r1"));

        let result = engine.apply_refresh(Err(FetchError::Unavailable("down".to_string())));
        assert!(result.is_err());
        assert_eq!(gateway.fired_count(), 0);
        assert!(engine.registry().contains("r1"));
        assert!(engine.store().get_by_id("r1").is_some());
        assert!(engine.status().last_refresh_error.is_some());
    }

    #[test]
    fn room_missing_members_key_keeps_watch() {
        let (mut engine, gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("r1", 6)]));
        engine.subscribe(RoomId::new("r1"));

        let body = r#"{"rooms":[{
            "roomId":"r1","name":"room r1","needPasswd":false,
            "ownerUser":{"userId":"u1","nickname":"o","idProvider":"ymid-kr",
                "avatar":{"type":"image","url":"x"},"lastPlayedPart":{"part":"bass"}}
        }]}"#;
        let result = engine.apply_refresh(crate::source::parse_rooms(body));
        assert!(matches!(result, Err(FetchError::Decode(_))));
        assert_eq!(gateway.fired_count(), 0);
        assert!(engine.registry().contains("r1"));
        let Some(held) = engine.store().get_by_id("r1") else {
            panic!("previous snapshot should be kept");
        };
        assert!(held.is_full());
    }

    #[test]
    fn request_toggle_enforces_full_room_on_add() {
        let (mut engine, _gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("full", 6), room("open", 2)]));

        assert!(matches!(
            engine.request_toggle(RoomId::new("missing")),
            Err(WatchError::RoomNotFound(_))
        ));
        assert!(matches!(
            engine.request_toggle(RoomId::new("open")),
            Err(WatchError::RoomNotFull(_))
        ));
        assert!(matches!(
            engine.request_toggle(RoomId::new("full")),
            Ok(ToggleOutcome::Subscribed)
        ));
        assert!(matches!(
            engine.request_toggle(RoomId::new("full")),
            Ok(ToggleOutcome::Unsubscribed)
        ));
    }

    #[test]
    fn request_toggle_allows_removing_vanished_room() {
        let (mut engine, _gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("r1", 6)]));
        engine.subscribe(RoomId::new("r1"));
        let _ = engine.apply_refresh(Ok(vec![]));
        assert!(engine.registry().contains("r1"));

        assert!(matches!(
            engine.request_toggle(RoomId::new("r1")),
            Ok(ToggleOutcome::Unsubscribed)
        ));
        assert!(engine.registry().is_empty());
    }

    #[tokio::test]
    async fn publishes_events_in_order() {
        let (mut engine, _gateway, bus) = engine();
        let mut rx = bus.subscribe();

        let _ = engine.apply_refresh(Ok(vec![room("r1", 6)]));
        engine.subscribe(RoomId::new("r1"));
        let _ = engine.apply_refresh(Ok(vec![room("r1", 3)]));

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type_str());
        }
        assert_eq!(
            kinds,
            vec![
                "snapshot_refreshed",
                "watch_added",
                "snapshot_refreshed",
                "watch_fired"
            ]
        );
    }

    #[test]
    fn rooms_view_marks_watched() {
        let (mut engine, _gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("a", 6), room("b", 6)]));
        engine.subscribe(RoomId::new("b"));

        let view = engine.rooms_view();
        assert!(view.is_watched("b"));
        assert!(!view.is_watched("a"));
        assert!(view.room("a").is_some());
    }

    #[test]
    fn status_reports_counts_and_permission() {
        let (mut engine, _gateway, _bus) = engine();
        let _ = engine.apply_refresh(Ok(vec![room("a", 6), room("b", 1)]));
        engine.subscribe(RoomId::new("a"));

        let status = engine.status();
        assert_eq!(status.room_count, 2);
        assert_eq!(status.watch_count, 1);
        assert!(status.snapshot_fetched_at.is_some());
        assert_eq!(status.notification_permission, Permission::Granted);
    }
}
