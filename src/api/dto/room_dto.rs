//! Room listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Avatar, Member, Room, RoomFilter, RoomId};

/// Query parameters for `GET /rooms`.
///
/// Every flag defaults to `true`; rooms without members are never listed.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomListParams {
    /// Include rooms that require a password.
    pub with_password: Option<bool>,
    /// Include rooms that do not require a password.
    pub without_password: Option<bool>,
    /// Include rooms owned through the Korean provider.
    pub korean: Option<bool>,
    /// Include rooms owned through the Japanese provider.
    pub japanese: Option<bool>,
}

impl From<RoomListParams> for RoomFilter {
    fn from(params: RoomListParams) -> Self {
        Self {
            with_password: params.with_password.unwrap_or(true),
            without_password: params.without_password.unwrap_or(true),
            korean: params.korean.unwrap_or(true),
            japanese: params.japanese.unwrap_or(true),
        }
    }
}

/// Avatar rendering hint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvatarDto {
    /// Built-in avatar.
    Preset {
        /// Background colour code.
        color_code: String,
        /// Shape key.
        shape_key: String,
    },
    /// Uploaded image.
    Image {
        /// Image URL.
        url: String,
    },
}

impl From<&Avatar> for AvatarDto {
    fn from(avatar: &Avatar) -> Self {
        match avatar {
            Avatar::Preset {
                color_code,
                shape_key,
            } => Self::Preset {
                color_code: color_code.clone(),
                shape_key: shape_key.clone(),
            },
            Avatar::Image { url } => Self::Image { url: url.clone() },
        }
    }
}

/// Room member.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberDto {
    /// Upstream user id.
    pub member_id: String,
    /// Display name.
    pub nickname: String,
    /// Whether this member owns the room.
    pub is_owner: bool,
    /// Avatar.
    pub avatar: AvatarDto,
    /// Last played part.
    pub activity: String,
}

/// Room with its watch state.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDto {
    /// Room identifier.
    pub room_id: RoomId,
    /// Room title.
    pub name: String,
    /// Room description.
    pub description: String,
    /// Current member count.
    pub member_count: usize,
    /// Maximum member count.
    pub capacity: usize,
    /// Whether the room is at capacity.
    pub is_full: bool,
    /// Whether joining requires a password.
    pub needs_password: bool,
    /// Owner's provider region (`kr`, `jp`, or the raw provider).
    pub region: String,
    /// Members in upstream order.
    pub members: Vec<MemberDto>,
    /// Whether a watch is active on this room.
    pub watched: bool,
    /// Deep link that opens the room in the desktop client.
    pub join_url: Option<String>,
}

impl RoomDto {
    /// Builds the DTO for `room`, using `join_url_base` for the deep link.
    #[must_use]
    pub fn from_room(room: &Room, watched: bool, join_url_base: &str) -> Self {
        let join_url = match room.join_url(join_url_base) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, base = join_url_base, "invalid join url base");
                None
            }
        };
        Self {
            room_id: room.id.clone(),
            name: room.name.clone(),
            description: room.description.clone(),
            member_count: room.members.len(),
            capacity: room.capacity,
            is_full: room.is_full(),
            needs_password: room.needs_password,
            region: room.provider_region.as_str().to_string(),
            members: room
                .members
                .iter()
                .map(|member| member_dto(room, member))
                .collect(),
            watched,
            join_url,
        }
    }
}

fn member_dto(room: &Room, member: &Member) -> MemberDto {
    MemberDto {
        member_id: member.id.clone(),
        nickname: member.nickname.clone(),
        is_owner: room.owner_is(member),
        avatar: AvatarDto::from(&member.avatar),
        activity: member.current_activity.label().to_string(),
    }
}

/// Response for `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Rooms passing the filter, in upstream order.
    pub data: Vec<RoomDto>,
    /// Number of rooms returned.
    pub total: usize,
    /// Fetch instant of the snapshot the list was built from.
    pub snapshot_fetched_at: Option<DateTime<Utc>>,
}
