//! Events describing watch and snapshot state changes.
//!
//! The engine publishes a [`WatchEvent`] through the [`super::EventBus`]
//! after every state change. Events are streamed to API clients over SSE.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::RoomId;
use super::watch_registry::FiredWatch;

/// State change emitted by the engine.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// A room id was added to the watch set.
    WatchAdded {
        /// Watched room.
        room_id: RoomId,
        /// When the watch was added.
        timestamp: DateTime<Utc>,
    },

    /// A room id was removed from the watch set by the user.
    WatchRemoved {
        /// Room no longer watched.
        room_id: RoomId,
        /// When the watch was removed.
        timestamp: DateTime<Utc>,
    },

    /// A watched room freed a slot; the watch was consumed.
    WatchFired {
        /// Room that freed a slot.
        room_id: RoomId,
        /// Room name at firing time.
        room_name: String,
        /// Members present when the slot was observed.
        members: usize,
        /// Whether the notification gateway presented the alert.
        delivered: bool,
        /// Gateway error, if delivery failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// When the watch fired.
        timestamp: DateTime<Utc>,
    },

    /// A poll succeeded and replaced the snapshot.
    SnapshotRefreshed {
        /// Rooms in the new snapshot.
        room_count: usize,
        /// Fetch instant of the new snapshot.
        timestamp: DateTime<Utc>,
    },

    /// A poll failed; the previous snapshot is kept.
    RefreshFailed {
        /// Rendered fetch error.
        error: String,
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
    },
}

impl WatchEvent {
    /// Room this event concerns, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::WatchAdded { room_id, .. }
            | Self::WatchRemoved { room_id, .. }
            | Self::WatchFired { room_id, .. } => Some(room_id),
            Self::SnapshotRefreshed { .. } | Self::RefreshFailed { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::WatchAdded { .. } => "watch_added",
            Self::WatchRemoved { .. } => "watch_removed",
            Self::WatchFired { .. } => "watch_fired",
            Self::SnapshotRefreshed { .. } => "snapshot_refreshed",
            Self::RefreshFailed { .. } => "refresh_failed",
        }
    }
}

impl From<&FiredWatch> for WatchEvent {
    fn from(fired: &FiredWatch) -> Self {
        Self::WatchFired {
            room_id: fired.room_id.clone(),
            room_name: fired.room_name.clone(),
            members: fired.members,
            delivered: fired.delivered(),
            error: fired.delivery.as_ref().err().map(ToString::to_string),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationError;

    #[test]
    fn fired_event_carries_delivery_error() {
        let fired = FiredWatch {
            room_id: RoomId::new("r1"),
            room_name: "jam".to_string(),
            members: 5,
            delivery: Err(NotificationError::PermissionDenied),
        };
        let event = WatchEvent::from(&fired);
        assert_eq!(event.event_type_str(), "watch_fired");
        assert_eq!(event.room_id(), Some(&RoomId::new("r1")));

        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"watch_fired\""));
        assert!(json.contains("\"delivered\":false"));
        assert!(json.contains("permission"));
    }

    #[test]
    fn snapshot_events_have_no_room() {
        let event = WatchEvent::SnapshotRefreshed {
            room_count: 3,
            timestamp: Utc::now(),
        };
        assert!(event.room_id().is_none());
        assert_eq!(event.event_type_str(), "snapshot_refreshed");
    }
}
