//! Display filter for room listings.
//!
//! A pure view over a snapshot: it never mutates rooms or watches.

use super::{ProviderRegion, Room};

/// Name of the permanent upstream test room.
pub const OFFICIAL_TEST_ROOM: &str = "Official Test Room";
/// Nickname of the bot that owns the test room.
pub const OFFICIAL_TEST_ROOM_OWNER: &str = "SYNCROOM_bot";

/// Which rooms a listing shows.
///
/// Rooms without members are always hidden. With both regions deselected
/// only the official test room is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomFilter {
    /// Show rooms that require a password.
    pub with_password: bool,
    /// Show rooms that do not require a password.
    pub without_password: bool,
    /// Show rooms owned through the Korean provider.
    pub korean: bool,
    /// Show rooms owned through the Japanese provider.
    pub japanese: bool,
}

impl Default for RoomFilter {
    fn default() -> Self {
        Self {
            with_password: true,
            without_password: true,
            korean: true,
            japanese: true,
        }
    }
}

impl RoomFilter {
    /// Returns `true` if `room` passes the filter.
    #[must_use]
    pub fn matches(&self, room: &Room) -> bool {
        if room.members.is_empty() {
            return false;
        }

        let password_ok = (self.with_password && self.without_password)
            || (self.with_password && room.needs_password)
            || (self.without_password && !room.needs_password);
        if !password_ok {
            return false;
        }

        match (self.korean, self.japanese) {
            (true, true) => true,
            (true, false) => room.provider_region == ProviderRegion::Kr,
            (false, true) => room.provider_region == ProviderRegion::Jp,
            (false, false) => is_official_test_room(room),
        }
    }

    /// Rooms from `rooms` that pass the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, rooms: &'a [Room]) -> Vec<&'a Room> {
        rooms.iter().filter(|room| self.matches(room)).collect()
    }
}

fn is_official_test_room(room: &Room) -> bool {
    room.name == OFFICIAL_TEST_ROOM && room.owner.nickname == OFFICIAL_TEST_ROOM_OWNER
}
