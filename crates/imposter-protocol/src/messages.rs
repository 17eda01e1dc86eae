//! Request/response records and the envelope they travel in.
//!
//! The Room Service speaks four operations (`create`, `join`, `nextRound`,
//! `sync`) plus a best-effort `leave`. Every successful call answers with a
//! [`RoomView`]: the room as ONE player is allowed to see it.

use serde::{Deserialize, Serialize};

use crate::{Locale, PackId, PlayerId, Role, RoomCode};

// ---------------------------------------------------------------------------
// RoomView
// ---------------------------------------------------------------------------

/// A roster entry. Other players' roles and words are never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Sanitized display name.
    pub name: String,
    /// Whether this player currently holds host privileges.
    pub is_host: bool,
}

/// One player's view of a room, as returned by every Room Service call.
///
/// `role` and `word` are `None` while the room is still waiting for enough
/// players, and for players who joined after the current round was dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    /// Shareable room code.
    pub room_id: RoomCode,
    /// The viewing player's own id.
    pub player_id: PlayerId,
    /// The viewing player's own (sanitized) name.
    pub name: String,
    /// Whether the viewing player is the host.
    pub is_host: bool,
    /// Current round. Starts at 1 and never decreases.
    pub round: u32,
    /// The viewer's role this round, if dealt in.
    pub role: Option<Role>,
    /// The viewer's word this round, if dealt in.
    pub word: Option<String>,
    /// Word pack the room draws from.
    pub pack_id: PackId,
    /// Imposter count requested by the host (clamped per deal).
    pub imposters: usize,
    /// Everyone in the room, in join order.
    pub players: Vec<PlayerSummary>,
}

impl RoomView {
    /// Returns `true` once the viewer has a role and word for this round.
    pub fn is_dealt_in(&self) -> bool {
        self.role.is_some() && self.word.is_some()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `create(locale, name, packId, imposters)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoom {
    #[serde(default)]
    pub locale: Locale,
    pub name: String,
    #[serde(default)]
    pub pack_id: PackId,
    pub imposters: usize,
}

/// `join(locale, roomId, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    #[serde(default)]
    pub locale: Locale,
    pub room_id: RoomCode,
    pub name: String,
}

/// `nextRound`, `sync` and `leave` all address an existing seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRequest {
    #[serde(default)]
    pub locale: Locale,
    pub room_id: RoomCode,
    pub player_id: PlayerId,
}

impl RoomRequest {
    /// Builds the request that addresses the viewer's own seat in `view`.
    pub fn for_view(locale: Locale, view: &RoomView) -> Self {
        Self {
            locale,
            room_id: view.room_id.clone(),
            player_id: view.player_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Client → Server payloads.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON such as
/// `{ "type": "Sync", "room_id": "K7QX2M", "player_id": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    Create(CreateRoom),
    Join(JoinRoom),
    NextRound(RoomRequest),
    /// Read-only; must succeed even if nothing changed.
    Sync(RoomRequest),
    Leave(RoomRequest),
    /// Keep-alive; the server echoes `client_time` for RTT measurement.
    Heartbeat { client_time: u64 },
}

/// Server → Client payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The caller's fresh view (answer to create/join/nextRound/sync).
    Room(RoomView),
    /// The caller's seat was released (answer to leave).
    Left { room_id: RoomCode },
    /// Push notice: something in a watched room changed. Never a reply.
    RoomChanged(RoomChanged),
    HeartbeatAck { client_time: u64, server_time: u64 },
    /// A request failed. `code` follows HTTP conventions
    /// (400 bad request, 403 not host, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

/// Announces that a room's state moved. Receivers should `sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChanged {
    pub room_id: RoomCode,
    pub round: u32,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level frame. Every message on the wire is an `Envelope`.
///
/// Requests carry a client-chosen `seq`; replies echo it in `reply_to` so a
/// client with several requests in flight can match them up. Push notices
/// have no `reply_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Sender-side sequence number.
    pub seq: u64,
    /// `seq` of the request this answers, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u64>,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// A frame that doesn't answer anything (requests and push notices).
    pub fn request(seq: u64, timestamp: u64, payload: T) -> Self {
        Self {
            seq,
            reply_to: None,
            timestamp,
            payload,
        }
    }

    /// A frame answering the request with sequence number `reply_to`.
    pub fn reply(seq: u64, reply_to: u64, timestamp: u64, payload: T) -> Self {
        Self {
            seq,
            reply_to: Some(reply_to),
            timestamp,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    //! The browser client parses these shapes by hand, so the tests pin the
    //! JSON layout rather than just checking that decoding works.

    use super::*;

    fn code() -> RoomCode {
        RoomCode::parse("K7QX2M").unwrap()
    }

    fn view() -> RoomView {
        RoomView {
            room_id: code(),
            player_id: PlayerId("abc".into()),
            name: "Ana".into(),
            is_host: true,
            round: 2,
            role: Some(Role::Imposter),
            word: Some("Tiger".into()),
            pack_id: PackId::default(),
            imposters: 1,
            players: vec![PlayerSummary {
                name: "Ana".into(),
                is_host: true,
            }],
        }
    }

    #[test]
    fn test_client_message_sync_is_internally_tagged() {
        let msg = ClientMessage::Sync(RoomRequest {
            locale: Locale::default(),
            room_id: code(),
            player_id: PlayerId("abc".into()),
        });
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Sync");
        assert_eq!(json["room_id"], "K7QX2M");
        assert_eq!(json["player_id"], "abc");
        assert_eq!(json["locale"], "en");
    }

    #[test]
    fn test_create_defaults_locale_and_pack_when_missing() {
        let json = r#"{ "type": "Create", "name": "Ana", "imposters": 1 }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        match msg {
            ClientMessage::Create(req) => {
                assert_eq!(req.locale, Locale::default());
                assert_eq!(req.pack_id, PackId::default());
                assert_eq!(req.imposters, 1);
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn test_join_with_lowercase_code_decodes() {
        let json = r#"{ "type": "Join", "room_id": "k7qx2m", "name": "Bo" }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Join(req) if req.room_id == code()));
    }

    #[test]
    fn test_join_with_malformed_code_fails_to_decode() {
        let json = r#"{ "type": "Join", "room_id": "??", "name": "Bo" }"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_room_message_json_format() {
        let json = serde_json::to_value(ServerMessage::Room(view())).unwrap();

        assert_eq!(json["type"], "Room");
        assert_eq!(json["round"], 2);
        assert_eq!(json["role"], "imposter");
        assert_eq!(json["word"], "Tiger");
        assert_eq!(json["players"][0]["name"], "Ana");
    }

    #[test]
    fn test_undealt_view_serializes_nulls() {
        let mut v = view();
        v.role = None;
        v.word = None;
        let json = serde_json::to_value(ServerMessage::Room(v.clone())).unwrap();

        assert!(json["role"].is_null());
        assert!(json["word"].is_null());
        assert!(!v.is_dealt_in());
    }

    #[test]
    fn test_envelope_request_omits_reply_to() {
        let env = Envelope::request(4, 10, ClientMessage::Heartbeat { client_time: 1 });
        let json = serde_json::to_value(&env).unwrap();

        assert!(json.get("reply_to").is_none());
        assert_eq!(json["payload"]["type"], "Heartbeat");
    }

    #[test]
    fn test_envelope_reply_carries_reply_to() {
        let env = Envelope::reply(9, 4, 10, ServerMessage::Left { room_id: code() });
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json["reply_to"], 4);
        assert_eq!(json["payload"]["room_id"], "K7QX2M");
    }

    #[test]
    fn test_unknown_message_type_fails() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type": "StealRoles"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_room_request_for_view_addresses_own_seat() {
        let req = RoomRequest::for_view(Locale::new("es"), &view());
        assert_eq!(req.room_id, code());
        assert_eq!(req.player_id, PlayerId("abc".into()));
        assert_eq!(req.locale.as_str(), "es");
    }
}
