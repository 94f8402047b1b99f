//! `reqwest`-backed room source.

use serde::Deserialize;

use super::{FetchError, RoomSource};
use crate::domain::Room;

/// Default public endpoint listing online rooms.
pub const DEFAULT_ROOMS_URL: &str =
    "https://webapi.syncroom.appservice.yamaha.com/rooms/guest/online";

/// Envelope returned by the room feed.
#[derive(Debug, Deserialize)]
struct RoomsEnvelope {
    rooms: Vec<Room>,
}

/// Polls the public room listing over HTTP.
///
/// No request timeout is configured beyond the client default; a hung
/// request only delays the next poll.
#[derive(Debug, Clone)]
pub struct HttpRoomSource {
    http: reqwest::Client,
    url: String,
}

impl HttpRoomSource {
    /// Creates a source reading from `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Endpoint this source reads from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RoomSource for HttpRoomSource {
    async fn fetch_rooms(&self) -> Result<Vec<Room>, FetchError> {
        let resp = self.http.get(&self.url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_rooms(&body)
    }
}

/// Decodes a room feed body.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the body is not a room envelope.
pub fn parse_rooms(body: &str) -> Result<Vec<Room>, FetchError> {
    let envelope: RoomsEnvelope = serde_json::from_str(body)?;
    Ok(envelope.rooms)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope() {
        let body = r#"{"rooms":[{
            "roomId":"r1","name":"jam","needPasswd":false,
            "ownerUser":{"userId":"u1","nickname":"o","idProvider":"ymid-kr",
                "avatar":{"type":"image","url":"x"},"lastPlayedPart":{"part":"vocal"}},
            "members":[]
        }]}"#;
        let Ok(rooms) = parse_rooms(body) else {
            panic!("envelope should parse");
        };
        assert_eq!(rooms.len(), 1);
        assert!(rooms.iter().all(|room| room.members.is_empty()));
    }

    #[test]
    fn error_body_without_rooms_is_decode_error() {
        let result = parse_rooms(r#"{"message":"maintenance"}"#);
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn room_without_members_key_is_decode_error() {
        let body = r#"{"rooms":[{
            "roomId":"r1","name":"jam","needPasswd":false,
            "ownerUser":{"userId":"u1","nickname":"o","idProvider":"ymid-kr",
                "avatar":{"type":"image","url":"x"},"lastPlayedPart":{"part":"vocal"}}
        }]}"#;
        assert!(matches!(parse_rooms(body), Err(FetchError::Decode(_))));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let result = parse_rooms("<html>maintenance</html>");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn keeps_configured_url() {
        let source = HttpRoomSource::new(DEFAULT_ROOMS_URL);
        assert_eq!(source.url(), DEFAULT_ROOMS_URL);
    }
}
