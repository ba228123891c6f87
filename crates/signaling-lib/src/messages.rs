// ============================
// signaling-lib/src/messages.rs
// ============================
//! Wire message types for the client boundary.
//!
//! Every frame is a JSON object `{"type": "...", "payload": {...}}` with a
//! kebab-case type name and camelCase payload fields. Negotiation fragments
//! (`offer`, `answer`, `candidate`) are opaque `serde_json::Value`s that the
//! hub re-emits verbatim; it never schematises them.

use crate::error::RoomErrorCode;
use crate::room::ParticipantView;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Messages received from a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_code: String,
        peer_id: String,
        name: String,
        #[serde(default)]
        is_host: bool,
    },
    LeaveRoom,
    WebrtcOffer {
        to: String,
        offer: Value,
    },
    WebrtcAnswer {
        to: String,
        answer: Value,
    },
    WebrtcIceCandidate {
        to: String,
        candidate: Value,
    },
    MediaState {
        video_enabled: bool,
        audio_enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screen_sharing: Option<bool>,
    },
    ChatMessage {
        message: String,
    },
    ScreenShareStart,
    ScreenShareStop,
}

/// Messages sent to a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    RoomJoined {
        room_code: String,
        is_host: bool,
        participants: Vec<ParticipantView>,
    },
    RoomError {
        code: RoomErrorCode,
        message: String,
    },
    RoomLeft,
    ParticipantJoined {
        participant: ParticipantView,
    },
    ParticipantLeft {
        participant_id: Uuid,
        peer_id: String,
    },
    ParticipantsUpdate {
        participants: Vec<ParticipantView>,
    },
    WebrtcOffer {
        to: String,
        from: String,
        offer: Value,
    },
    WebrtcAnswer {
        to: String,
        from: String,
        answer: Value,
    },
    WebrtcIceCandidate {
        to: String,
        from: String,
        candidate: Value,
    },
    MediaStateChanged {
        participant_id: Uuid,
        peer_id: String,
        video_enabled: bool,
        audio_enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screen_sharing: Option<bool>,
    },
    ChatMessage {
        from: Uuid,
        from_name: String,
        message: String,
        timestamp: i64,
    },
    ScreenShareStarted {
        participant_id: Uuid,
        peer_id: String,
    },
    ScreenShareStopped {
        participant_id: Uuid,
        peer_id: String,
    },
}

impl ServerMessage {
    /// Build a `room-error` with the code's default message
    pub fn room_error(code: RoomErrorCode) -> Self {
        ServerMessage::RoomError {
            code,
            message: code.message().to_string(),
        }
    }
}
