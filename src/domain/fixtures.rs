//! Room builders shared by unit tests.

use super::{Activity, Avatar, Member, ProviderRegion, Room, RoomId};

pub(crate) fn member(id: &str, region: ProviderRegion) -> Member {
    Member {
        id: id.to_string(),
        nickname: format!("nick-{id}"),
        provider_region: region,
        avatar: Avatar::Preset {
            color_code: "e9ebff".to_string(),
            shape_key: "user2".to_string(),
        },
        current_activity: Activity::Standard("guitar".to_string()),
    }
}

/// A Korean-owned, password-free room with `members` participants.
pub(crate) fn room(id: &str, members: usize) -> Room {
    room_with(id, members, false, ProviderRegion::Kr)
}

pub(crate) fn room_with(
    id: &str,
    members: usize,
    needs_password: bool,
    region: ProviderRegion,
) -> Room {
    let owner = member(&format!("{id}-owner"), region.clone());
    let mut roster = Vec::with_capacity(members);
    if members > 0 {
        roster.push(owner.clone());
    }
    for n in 1..members {
        roster.push(member(&format!("{id}-m{n}"), region.clone()));
    }
    Room {
        id: RoomId::new(id),
        name: format!("room {id}"),
        description: String::new(),
        capacity: Room::DEFAULT_CAPACITY,
        members: roster,
        needs_password,
        owner,
        provider_region: region,
    }
}
