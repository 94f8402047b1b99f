//! Set of watched rooms and the reconciliation that consumes them.
//!
//! A watch is a standing request to be told, once, that a full room has
//! freed a slot. [`WatchRegistry`] holds the watched ids independently of
//! any [`super::Room`] value, so watches survive rooms being replaced on
//! every poll.
//!
//! # Lifecycle
//!
//! ```text
//! subscribe ──► Active ──(room found with a free slot)──► Fired (dropped)
//!                  │
//!                  └──(unsubscribe)──► dropped
//! ```
//!
//! An id whose room is absent from the snapshot stays `Active`.

use std::collections::HashSet;

use serde::Serialize;
use utoipa::ToSchema;

use super::{RoomId, Snapshot};
use crate::notify::{Notification, NotificationError, NotificationGateway};

/// Result of a [`WatchRegistry::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The id was added.
    Subscribed,
    /// The id was removed.
    Unsubscribed,
}

/// A watch consumed by [`WatchRegistry::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredWatch {
    /// Room that freed a slot.
    pub room_id: RoomId,
    /// Room name at the time of firing.
    pub room_name: String,
    /// Members present when the slot was observed.
    pub members: usize,
    /// Gateway outcome. The watch is consumed either way.
    pub delivery: Result<(), NotificationError>,
}

impl FiredWatch {
    /// Returns `true` if the gateway presented the notification.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.delivery.is_ok()
    }
}

/// Watched room ids.
#[derive(Debug, Default, Clone)]
pub struct WatchRegistry {
    watched: HashSet<RoomId>,
}

impl WatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `id`. Returns `true` if the set changed.
    ///
    /// The caller is expected to have observed the room at full capacity;
    /// this is not checked here.
    pub fn subscribe(&mut self, id: RoomId) -> bool {
        self.watched.insert(id)
    }

    /// Stops watching `id`. Returns `true` if the set changed.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.watched.remove(id)
    }

    /// Flips membership of `id`.
    pub fn toggle(&mut self, id: RoomId) -> ToggleOutcome {
        if self.watched.remove(id.as_str()) {
            ToggleOutcome::Unsubscribed
        } else {
            self.watched.insert(id);
            ToggleOutcome::Subscribed
        }
    }

    /// Returns `true` if `id` is watched.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.watched.contains(id)
    }

    /// Watched ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.watched.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of watched ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    /// Returns `true` if nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Fires and drops every watch whose room has a free slot in `snapshot`.
    ///
    /// Each due id is removed from the set before the gateway is called, so
    /// an id fires at most once no matter how many passes run. Gateway
    /// failures are reported in the returned [`FiredWatch`] but do not
    /// restore the watch. Ids missing from the snapshot are left untouched.
    /// No order is guaranteed between ids firing in the same pass.
    pub fn reconcile<G: NotificationGateway>(
        &mut self,
        snapshot: &Snapshot,
        gateway: &G,
    ) -> Vec<FiredWatch> {
        let due: Vec<RoomId> = self
            .watched
            .iter()
            .filter(|id| {
                snapshot
                    .get_by_id(id.as_str())
                    .is_some_and(super::Room::has_free_slot)
            })
            .cloned()
            .collect();

        let mut fired = Vec::with_capacity(due.len());
        for room_id in due {
            let Some(room) = snapshot.get_by_id(room_id.as_str()) else {
                continue;
            };
            self.watched.remove(room_id.as_str());

            let delivery = gateway.fire(&Notification::vacancy(room));
            match &delivery {
                Ok(()) => tracing::info!(
                    %room_id,
                    room_name = %room.name,
                    members = room.members.len(),
                    "watched room has a free slot; notified"
                ),
                Err(e) => tracing::error!(
                    %room_id,
                    error = %e,
                    "watched room has a free slot but notification failed; watch consumed"
                ),
            }

            fired.push(FiredWatch {
                room_id,
                room_name: room.name.clone(),
                members: room.members.len(),
                delivery,
            });
        }
        fired
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::fixtures::room;
    use crate::notify::MemoryNotifier;

    fn snapshot(rooms: Vec<crate::domain::Room>) -> Snapshot {
        Snapshot::new(rooms, Utc::now())
    }

    #[test]
    fn subscribe_and_unsubscribe_are_idempotent() {
        let mut registry = WatchRegistry::new();
        assert!(registry.subscribe(RoomId::new("r1")));
        assert!(!registry.subscribe(RoomId::new("r1")));
        assert_eq!(registry.len(), 1);

        assert!(registry.unsubscribe("r1"));
        assert!(!registry.unsubscribe("r1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn double_toggle_restores_membership() {
        let mut registry = WatchRegistry::new();
        assert_eq!(registry.toggle(RoomId::new("r1")), ToggleOutcome::Subscribed);
        assert_eq!(registry.toggle(RoomId::new("r1")), ToggleOutcome::Unsubscribed);
        assert!(!registry.contains("r1"));

        registry.subscribe(RoomId::new("r2"));
        registry.toggle(RoomId::new("r2"));
        registry.toggle(RoomId::new("r2"));
        assert!(registry.contains("r2"));
    }

    #[test]
    fn full_room_does_not_fire() {
        let gateway = MemoryNotifier::granted();
        let mut registry = WatchRegistry::new();
        registry.subscribe(RoomId::new("r1"));

        let fired = registry.reconcile(&snapshot(vec![room("r1", 6)]), &gateway);
        assert!(fired.is_empty());
        assert!(registry.contains("r1"));
        assert_eq!(gateway.fired_count(), 0);
    }

    #[test]
    fn freed_room_fires_once_and_is_removed() {
        let gateway = MemoryNotifier::granted();
        let mut registry = WatchRegistry::new();
        registry.subscribe(RoomId::new("r1"));

        let freed = snapshot(vec![room("r1", 5)]);
        let fired = registry.reconcile(&freed, &gateway);
        assert_eq!(fired.len(), 1);
        let Some(first) = fired.first() else {
            panic!("one watch should fire");
        };
        assert_eq!(first.room_id.as_str(), "r1");
        assert_eq!(first.members, 5);
        assert!(first.delivered());
        assert!(!registry.contains("r1"));

        let again = registry.reconcile(&freed, &gateway);
        assert!(again.is_empty());
        assert_eq!(gateway.fired_count(), 1);
        let Some(notification) = gateway.fired().into_iter().next() else {
            panic!("notification recorded");
        };
        assert!(notification.title.contains("room r1"));
    }

    #[test]
    fn missing_room_stays_pending() {
        let gateway = MemoryNotifier::granted();
        let mut registry = WatchRegistry::new();
        registry.subscribe(RoomId::new("gone"));

        let fired = registry.reconcile(&snapshot(vec![room("r1", 2)]), &gateway);
        assert!(fired.is_empty());
        assert!(registry.contains("gone"));

        let fired = registry.reconcile(&snapshot(vec![room("gone", 4)]), &gateway);
        assert_eq!(fired.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn denied_gateway_still_consumes_watch() {
        let gateway = MemoryNotifier::denied();
        let mut registry = WatchRegistry::new();
        registry.subscribe(RoomId::new("r1"));

        let fired = registry.reconcile(&snapshot(vec![room("r1", 0)]), &gateway);
        let Some(first) = fired.first() else {
            panic!("watch should be consumed");
        };
        assert_eq!(first.delivery, Err(NotificationError::PermissionDenied));
        assert!(!registry.contains("r1"));
    }

    #[test]
    fn several_rooms_fire_independently() {
        let gateway = MemoryNotifier::granted();
        let mut registry = WatchRegistry::new();
        for id in ["a", "b", "c"] {
            registry.subscribe(RoomId::new(id));
        }

        let fired = registry.reconcile(
            &snapshot(vec![room("a", 1), room("b", 6), room("c", 3)]),
            &gateway,
        );
        let mut ids: Vec<&str> = fired.iter().map(|f| f.room_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(registry.ids(), vec![RoomId::new("b")]);
        assert_eq!(gateway.fired_count(), 2);
    }
}
