//! Room and member model decoded from the upstream room feed.
//!
//! The upstream service publishes rooms in a camelCase JSON shape
//! (`roomId`, `needPasswd`, `ownerUser`, ...). That shape is decoded into
//! private wire structs and converted into the domain types below, so the
//! rest of the crate never sees upstream naming.

use serde::Deserialize;
use url::Url;

use super::RoomId;

/// Default launch endpoint used to build join deep links.
pub const DEFAULT_JOIN_URL_BASE: &str =
    "https://webapi.syncroom.appservice.yamaha.com/launch_app";

/// Region of the identity provider that registered a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRegion {
    /// Korean identity provider (`ymid-kr`).
    Kr,
    /// Japanese identity provider (`ymid-jp`).
    Jp,
    /// Any other provider, kept verbatim.
    Other(String),
}

impl ProviderRegion {
    /// Maps an upstream `idProvider` string to a region.
    #[must_use]
    pub fn from_provider(provider: &str) -> Self {
        match provider {
            "ymid-kr" => Self::Kr,
            "ymid-jp" => Self::Jp,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the short label used in API responses.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Kr => "kr",
            Self::Jp => "jp",
            Self::Other(provider) => provider,
        }
    }
}

/// How a member's avatar is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    /// Built-in avatar drawn from a shape and a colour.
    Preset {
        /// Background colour code (e.g. `"e9ebff"`).
        color_code: String,
        /// Shape key (e.g. `"user2"`).
        shape_key: String,
    },
    /// Custom uploaded image.
    Image {
        /// Image URL.
        url: String,
    },
}

/// What a member last played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    /// One of the predefined parts (e.g. `"guitar"`).
    Standard(String),
    /// A free-form part label set by the member.
    Custom(String),
}

impl Activity {
    /// Returns the label to display for this activity.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Standard(part) | Self::Custom(part) => part,
        }
    }
}

/// A participant of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Upstream user id.
    pub id: String,
    /// Display name.
    pub nickname: String,
    /// Region of the member's identity provider.
    pub provider_region: ProviderRegion,
    /// Avatar description.
    pub avatar: Avatar,
    /// Last played part.
    pub current_activity: Activity,
}

/// A remote room with a fixed member capacity.
///
/// Identity is [`Room::id`]. Rooms are replaced wholesale on every poll and
/// never merged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "wire::RoomWire")]
pub struct Room {
    /// Upstream room id.
    pub id: RoomId,
    /// Room title.
    pub name: String,
    /// Free-form room description.
    pub description: String,
    /// Maximum number of members.
    pub capacity: usize,
    /// Members in upstream order.
    pub members: Vec<Member>,
    /// Whether joining requires a password.
    pub needs_password: bool,
    /// Room owner.
    pub owner: Member,
    /// Region of the owner's identity provider.
    pub provider_region: ProviderRegion,
}

impl Room {
    /// Member capacity of every upstream room.
    pub const DEFAULT_CAPACITY: usize = 6;

    /// Returns `true` if no further member can join.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Returns `true` if at least one slot is free.
    #[must_use]
    pub fn has_free_slot(&self) -> bool {
        !self.is_full()
    }

    /// Returns `true` if `member` owns this room.
    #[must_use]
    pub fn owner_is(&self, member: &Member) -> bool {
        self.owner.id == member.id
    }

    /// Builds the deep link that launches the desktop client into this room.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base` is not a valid absolute URL.
    pub fn join_url(&self, base: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            base,
            &[
                ("roomName", self.name.as_str()),
                ("roomId", self.id.as_str()),
                ("requirePassword", if self.needs_password { "1" } else { "0" }),
            ],
        )
    }
}

/// Upstream JSON shape.
mod wire {
    use serde::Deserialize;

    use super::{Activity, Avatar, Member, ProviderRegion, Room, RoomId};

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct RoomWire {
        room_id: String,
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        need_passwd: bool,
        owner_user: UserWire,
        members: Vec<UserWire>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct UserWire {
        user_id: String,
        nickname: String,
        #[serde(default)]
        id_provider: String,
        avatar: AvatarWire,
        last_played_part: PartWire,
    }

    #[derive(Debug, Deserialize)]
    struct AvatarWire {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        preset: Option<PresetWire>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PresetWire {
        color_code: String,
        shape_key: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PartWire {
        #[serde(default)]
        part: String,
        #[serde(default)]
        custom_part: Option<String>,
    }

    impl From<AvatarWire> for Avatar {
        fn from(wire: AvatarWire) -> Self {
            match (wire.kind.as_str(), wire.preset) {
                ("preset", Some(preset)) => Self::Preset {
                    color_code: preset.color_code,
                    shape_key: preset.shape_key,
                },
                _ => Self::Image {
                    url: wire.url.unwrap_or_default(),
                },
            }
        }
    }

    impl From<PartWire> for Activity {
        fn from(wire: PartWire) -> Self {
            match wire.custom_part {
                Some(label) if !label.is_empty() => Self::Custom(label),
                _ => Self::Standard(wire.part),
            }
        }
    }

    impl From<UserWire> for Member {
        fn from(wire: UserWire) -> Self {
            Self {
                id: wire.user_id,
                nickname: wire.nickname,
                provider_region: ProviderRegion::from_provider(&wire.id_provider),
                avatar: wire.avatar.into(),
                current_activity: wire.last_played_part.into(),
            }
        }
    }

    impl From<RoomWire> for Room {
        fn from(wire: RoomWire) -> Self {
            let owner = Member::from(wire.owner_user);
            Self {
                id: RoomId::new(wire.room_id),
                name: wire.name,
                description: wire.description,
                capacity: Room::DEFAULT_CAPACITY,
                members: wire.members.into_iter().map(Member::from).collect(),
                needs_password: wire.need_passwd,
                provider_region: owner.provider_region.clone(),
                owner,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ROOM_JSON: &str = r#"{
        "roomId": "r1",
        "name": "Late night jam",
        "description": "blues only",
        "roomPurpose": "session",
        "needPasswd": true,
        "tags": [],
        "ownerUser": {
            "userId": "u1",
            "nickname": "owner",
            "idProvider": "ymid-jp",
            "avatar": { "type": "preset", "preset": { "colorCode": "e9ebff", "shapeKey": "user2" } },
            "isBeginner": false,
            "lastPlayedPart": { "part": "guitar" }
        },
        "members": [
            {
                "userId": "u1",
                "nickname": "owner",
                "idProvider": "ymid-jp",
                "avatar": { "type": "preset", "preset": { "colorCode": "e9ebff", "shapeKey": "user2" } },
                "isBeginner": false,
                "lastPlayedPart": { "part": "guitar" }
            },
            {
                "userId": "u2",
                "nickname": "drummer",
                "idProvider": "ymid-kr",
                "avatar": { "type": "image", "url": "https://example.com/a.png" },
                "isBeginner": true,
                "lastPlayedPart": { "part": "other", "customPart": "cajon" }
            }
        ]
    }"#;

    fn decoded() -> Room {
        let Ok(room) = serde_json::from_str::<Room>(ROOM_JSON) else {
            panic!("room should decode");
        };
        room
    }

    #[test]
    fn decodes_upstream_shape() {
        let room = decoded();
        assert_eq!(room.id.as_str(), "r1");
        assert_eq!(room.capacity, Room::DEFAULT_CAPACITY);
        assert_eq!(room.members.len(), 2);
        assert!(room.needs_password);
        assert_eq!(room.provider_region, ProviderRegion::Jp);
    }

    #[test]
    fn decodes_avatar_and_activity_variants() {
        let room = decoded();
        let Some(owner) = room.members.first() else {
            panic!("owner missing");
        };
        let Some(drummer) = room.members.get(1) else {
            panic!("drummer missing");
        };
        assert!(matches!(owner.avatar, Avatar::Preset { ref shape_key, .. } if shape_key == "user2"));
        assert_eq!(owner.current_activity, Activity::Standard("guitar".to_string()));
        assert!(matches!(drummer.avatar, Avatar::Image { ref url } if url.ends_with("a.png")));
        assert_eq!(drummer.current_activity.label(), "cajon");
        assert_eq!(drummer.provider_region, ProviderRegion::Kr);
        assert!(room.owner_is(owner));
        assert!(!room.owner_is(drummer));
    }

    #[test]
    fn capacity_checks() {
        let mut room = decoded();
        assert!(room.has_free_slot());
        let Some(template) = room.members.first().cloned() else {
            panic!("no members");
        };
        while room.members.len() < Room::DEFAULT_CAPACITY {
            room.members.push(template.clone());
        }
        assert!(room.is_full());
        assert!(!room.has_free_slot());
    }

    #[test]
    fn join_url_encodes_name_and_password_flag() {
        let room = decoded();
        let Ok(url) = room.join_url(DEFAULT_JOIN_URL_BASE) else {
            panic!("valid base");
        };
        let query = url.query().unwrap_or_default();
        assert!(query.contains("roomName=Late+night+jam"));
        assert!(query.contains("roomId=r1"));
        assert!(query.contains("requirePassword=1"));
    }

    #[test]
    fn join_url_rejects_relative_base() {
        let room = decoded();
        assert!(room.join_url("launch_app").is_err());
    }

    #[test]
    fn unknown_provider_is_kept() {
        assert_eq!(
            ProviderRegion::from_provider("ymid-us"),
            ProviderRegion::Other("ymid-us".to_string())
        );
        assert_eq!(ProviderRegion::Other("x".to_string()).as_str(), "x");
    }
}
