// ============================
// signaling-lib/src/registry.rs
// ============================
//! Process-wide room registry.
//!
//! The registry is the only globally shared mutable structure in the hub.
//! Rooms live in a `DashMap`, so every mutation of a given room happens
//! under that room's entry lock and is serialised against concurrent
//! mutators. Registry-wide add/remove goes through the same map and stays
//! atomic per key.
//!
//! No operation returns live room state. Mutating calls hand back an
//! *outcome* value holding participant views and cloned outbound senders,
//! snapshotted before the entry lock is released, so callers fan events out
//! without holding any lock.

use crate::error::RoomErrorCode;
use crate::room::{ConnId, OutboundSender, Participant, ParticipantView, Room};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Room lookup key: lowercased, trimmed
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Registry operation failures, each mapping onto a wire error code
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("room '{0}' already exists")]
    RoomExists(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("room '{0}' is full")]
    RoomFull(String),

    #[error("peer id '{0}' is already taken in this room")]
    PeerIdTaken(String),
}

impl RegistryError {
    pub fn code(&self) -> RoomErrorCode {
        match self {
            RegistryError::RoomExists(_) => RoomErrorCode::RoomAlreadyExists,
            RegistryError::RoomNotFound(_) => RoomErrorCode::RoomNotFound,
            RegistryError::RoomFull(_) => RoomErrorCode::RoomFull,
            RegistryError::PeerIdTaken(_) => RoomErrorCode::PeerIdTaken,
        }
    }
}

/// Result of a successful admission
#[derive(Debug)]
pub struct JoinOutcome {
    pub room_code: String,
    pub joined: ParticipantView,
    /// Full roster after the admission, in join order
    pub roster: Vec<ParticipantView>,
    /// Senders of every *other* member, snapshot for fan-out
    pub recipients: Vec<(ConnId, OutboundSender)>,
    /// True when the connection was already a member (idempotent re-join)
    pub already_present: bool,
}

/// Result of a departure
pub struct LeaveOutcome {
    pub room_code: String,
    pub removed: ParticipantView,
    pub was_host: bool,
    pub new_host: Option<ConnId>,
    pub room_deleted: bool,
    /// Roster of the remaining members (empty when the room was deleted)
    pub roster: Vec<ParticipantView>,
    pub recipients: Vec<(ConnId, OutboundSender)>,
}

/// Registry-wide statistics snapshot for the admin surface
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_rooms: usize,
    pub total_participants: usize,
    /// Room-size distribution, keyed by size rendered as a string
    pub rooms_by_size: HashMap<String, usize>,
}

/// Process-wide mapping from room code to room state
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    max_participants: usize,
}

impl RoomRegistry {
    pub fn new(max_participants: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            max_participants,
        }
    }

    /// Create a room with `host` as its first participant.
    ///
    /// Fails with `RoomExists` when the normalized code is taken.
    pub fn create(&self, code: &str, host: Participant) -> Result<JoinOutcome, RegistryError> {
        let code = normalize_code(code);

        match self.rooms.entry(code.clone()) {
            Entry::Occupied(_) => Err(RegistryError::RoomExists(code)),
            Entry::Vacant(vacant) => {
                let room = Room::new(code.clone(), host);
                let roster = room.roster();
                let joined = roster[0].clone();
                vacant.insert(room);
                Ok(JoinOutcome {
                    room_code: code,
                    joined,
                    roster,
                    recipients: Vec::new(),
                    already_present: false,
                })
            },
        }
    }

    /// Admit `participant` to an existing room.
    ///
    /// Idempotent for a connection that is already a member: the existing
    /// record is returned untouched. Fails with `RoomNotFound`, `RoomFull`
    /// or `PeerIdTaken`.
    pub fn join(&self, code: &str, participant: Participant) -> Result<JoinOutcome, RegistryError> {
        let code = normalize_code(code);
        let mut room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| RegistryError::RoomNotFound(code.clone()))?;

        if let Some(existing) = room.participants.get(&participant.conn_id) {
            let joined = existing.view();
            return Ok(JoinOutcome {
                room_code: code,
                joined,
                roster: room.roster(),
                recipients: Vec::new(),
                already_present: true,
            });
        }

        if room.len() >= self.max_participants {
            return Err(RegistryError::RoomFull(code));
        }
        if room.has_peer_id(&participant.peer_id) {
            return Err(RegistryError::PeerIdTaken(participant.peer_id));
        }

        let conn_id = participant.conn_id;
        let joined = participant.view();
        room.participants.insert(conn_id, participant);
        room.touch();

        Ok(JoinOutcome {
            room_code: code,
            joined,
            roster: room.roster(),
            recipients: room.recipients(conn_id),
            already_present: false,
        })
    }

    /// Remove a connection from a room.
    ///
    /// Unknown room or unknown connection is a no-op returning `None`. A
    /// departing host triggers re-election; a room left empty is deleted.
    pub fn leave(&self, code: &str, conn_id: ConnId) -> Option<LeaveOutcome> {
        let code = normalize_code(code);

        let outcome = {
            let mut room = self.rooms.get_mut(&code)?;
            let removed = room.participants.remove(&conn_id)?;
            let was_host = removed.is_host;
            room.touch();

            let new_host = if was_host && !room.is_empty() {
                room.elect_host()
            } else {
                None
            };

            LeaveOutcome {
                room_code: code.clone(),
                removed: removed.view(),
                was_host,
                new_host,
                room_deleted: room.is_empty(),
                roster: room.roster(),
                recipients: room.recipients(conn_id),
            }
        };

        if outcome.room_deleted {
            // A join may have slipped in since the lock was dropped; only
            // delete if the room is still empty.
            self.rooms.remove_if(&code, |_, room| room.is_empty());
        }

        Some(outcome)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(&normalize_code(code))
    }

    /// Roster snapshot, or `None` for an unknown code
    pub fn participants_of(&self, code: &str) -> Option<Vec<ParticipantView>> {
        self.rooms.get(&normalize_code(code)).map(|r| r.roster())
    }

    /// Resolve a unicast addressee by peer id within a room
    pub fn relay_target(
        &self,
        code: &str,
        peer_id: &str,
    ) -> Option<(ParticipantView, OutboundSender)> {
        let room = self.rooms.get(&normalize_code(code))?;
        room.find_peer(peer_id)
            .map(|p| (p.view(), p.sender.clone()))
    }

    /// Fan-out recipient snapshot: every member except `except`
    pub fn recipients_of(&self, code: &str, except: ConnId) -> Vec<(ConnId, OutboundSender)> {
        self.rooms
            .get(&normalize_code(code))
            .map(|r| r.recipients(except))
            .unwrap_or_default()
    }

    /// Refresh a room's last-activity timestamp
    pub fn touch(&self, code: &str) {
        if let Some(mut room) = self.rooms.get_mut(&normalize_code(code)) {
            room.touch();
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut total_participants = 0;
        let mut rooms_by_size: HashMap<String, usize> = HashMap::new();

        for room in self.rooms.iter() {
            let size = room.len();
            total_participants += size;
            *rooms_by_size.entry(size.to_string()).or_default() += 1;
        }

        RegistryStats {
            total_rooms: self.rooms.len(),
            total_participants,
            rooms_by_size,
        }
    }

    /// Delete rooms whose last activity is older than `max_idle`.
    ///
    /// Returns the evicted room codes. Rooms that see activity between the
    /// scan and the removal survive.
    pub fn sweep_idle(&self, max_idle: Duration) -> Vec<String> {
        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|room| room.last_activity.elapsed() >= max_idle)
            .map(|room| room.key().clone())
            .collect();

        let mut evicted = Vec::new();
        for code in expired {
            if self
                .rooms
                .remove_if(&code, |_, room| room.last_activity.elapsed() >= max_idle)
                .is_some()
            {
                evicted.push(code);
            }
        }
        evicted
    }
}
