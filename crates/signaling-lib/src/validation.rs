// ============================
// signaling-lib/src/validation.rs
// ============================
//! Join-payload validation.
//!
//! Only `join-room` surfaces validation failures to the client; every other
//! malformed message is dropped at the router. Codes here are the subset of
//! the wire taxonomy a join can produce before the registry is consulted.

use crate::error::RoomErrorCode;
use thiserror::Error;

const MAX_ROOM_CODE_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 100;

/// Possible validation errors on a join request
#[derive(Error, Debug, PartialEq, Eq)]
pub enum JoinValidationError {
    #[error("Room code must be a non-empty string of at most {MAX_ROOM_CODE_LENGTH} characters")]
    InvalidRoomCode,

    #[error("Display name must be non-empty and at most {MAX_NAME_LENGTH} characters")]
    NameRequired,

    #[error("Peer id must be a non-empty string")]
    PeerIdRequired,
}

impl JoinValidationError {
    pub fn code(&self) -> RoomErrorCode {
        match self {
            JoinValidationError::InvalidRoomCode => RoomErrorCode::InvalidRoomCode,
            JoinValidationError::NameRequired => RoomErrorCode::NameRequired,
            JoinValidationError::PeerIdRequired => RoomErrorCode::PeerIdRequired,
        }
    }
}

/// Validate the fields of a `join-room` payload
pub fn validate_join_request(
    room_code: &str,
    peer_id: &str,
    name: &str,
) -> Result<(), JoinValidationError> {
    let code = room_code.trim();
    if code.is_empty() || code.chars().count() > MAX_ROOM_CODE_LENGTH {
        return Err(JoinValidationError::InvalidRoomCode);
    }

    if peer_id.trim().is_empty() {
        return Err(JoinValidationError::PeerIdRequired);
    }

    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(JoinValidationError::NameRequired);
    }

    Ok(())
}
