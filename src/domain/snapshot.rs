//! Immutable result of one successful poll.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{Room, RoomId};

/// The full room collection returned by one poll, plus the instant it was
/// fetched.
///
/// A snapshot is never edited in place: each poll builds a new one and the
/// store swaps it in. Lookups by id go through an index built at
/// construction time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    rooms: Vec<Room>,
    index: HashMap<RoomId, usize>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Builds a snapshot from rooms fetched at `fetched_at`.
    ///
    /// If the upstream feed repeats an id, the first occurrence wins.
    #[must_use]
    pub fn new(rooms: Vec<Room>, fetched_at: DateTime<Utc>) -> Self {
        let mut index = HashMap::with_capacity(rooms.len());
        for (position, room) in rooms.iter().enumerate() {
            index.entry(room.id.clone()).or_insert(position);
        }
        Self {
            rooms,
            index,
            fetched_at: Some(fetched_at),
        }
    }

    /// The snapshot held before the first successful poll.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rooms: Vec::new(),
            index: HashMap::new(),
            fetched_at: None,
        }
    }

    /// Looks up a room by id.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Room> {
        self.index.get(id).and_then(|&position| self.rooms.get(position))
    }

    /// Rooms in upstream order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Instant of the poll that produced this snapshot, `None` before the
    /// first successful poll.
    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if the snapshot holds no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
