//! Domain layer: rooms, snapshots, the watch registry, and the event system.
//!
//! This module contains the room model decoded from the upstream feed, the
//! snapshot store that holds the latest poll, the watch registry state
//! machine, and the event bus that broadcasts state changes.

pub mod event_bus;
pub mod room;
pub mod room_filter;
pub mod room_id;
pub mod snapshot;
pub mod snapshot_store;
pub mod watch_event;
pub mod watch_registry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use event_bus::EventBus;
pub use room::{Activity, Avatar, Member, ProviderRegion, Room};
pub use room_filter::RoomFilter;
pub use room_id::RoomId;
pub use snapshot::Snapshot;
pub use snapshot_store::RoomSnapshotStore;
pub use watch_event::WatchEvent;
pub use watch_registry::{FiredWatch, ToggleOutcome, WatchRegistry};
