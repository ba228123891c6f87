// ============================
// signaling-lib/src/error.rs
// ============================
//! The wire error taxonomy carried in `room-error` payloads.
//!
//! Only `join-room` failures surface to the client; registry and validation
//! errors map onto these codes at the router boundary.

use serde::{Deserialize, Serialize};

/// Error codes carried in `room-error.code` on a failed `join-room`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomErrorCode {
    RoomNotFound,
    RoomFull,
    RoomAlreadyExists,
    InvalidRoomCode,
    AlreadyInRoom,
    NameRequired,
    PeerIdRequired,
    PeerIdTaken,
    ServerError,
}

impl RoomErrorCode {
    /// Human-readable default message for the code
    pub fn message(self) -> &'static str {
        match self {
            RoomErrorCode::RoomNotFound => "Room not found",
            RoomErrorCode::RoomFull => "Room is full",
            RoomErrorCode::RoomAlreadyExists => "Room already exists",
            RoomErrorCode::InvalidRoomCode => "Invalid room code",
            RoomErrorCode::AlreadyInRoom => "Already in a room",
            RoomErrorCode::NameRequired => "Display name is required",
            RoomErrorCode::PeerIdRequired => "Peer id is required",
            RoomErrorCode::PeerIdTaken => "Peer id is already in use in this room",
            RoomErrorCode::ServerError => "Internal server error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_screaming_snake_case() {
        let json = serde_json::to_string(&RoomErrorCode::RoomNotFound).unwrap();
        assert_eq!(json, "\"ROOM_NOT_FOUND\"");

        let json = serde_json::to_string(&RoomErrorCode::PeerIdTaken).unwrap();
        assert_eq!(json, "\"PEER_ID_TAKEN\"");

        let code: RoomErrorCode = serde_json::from_str("\"ROOM_FULL\"").unwrap();
        assert_eq!(code, RoomErrorCode::RoomFull);
    }

    #[test]
    fn test_every_code_has_a_message() {
        for code in [
            RoomErrorCode::RoomNotFound,
            RoomErrorCode::RoomFull,
            RoomErrorCode::RoomAlreadyExists,
            RoomErrorCode::InvalidRoomCode,
            RoomErrorCode::AlreadyInRoom,
            RoomErrorCode::NameRequired,
            RoomErrorCode::PeerIdRequired,
            RoomErrorCode::PeerIdTaken,
            RoomErrorCode::ServerError,
        ] {
            assert!(!code.message().is_empty());
        }
    }
}
