// ============================
// signaling-lib/src/room.rs
// ============================
//! Room and participant records.
//!
//! A `Room` owns its participants for the whole of their lifetime. A
//! `ParticipantView` is the immutable snapshot handed across component
//! boundaries (wire payloads, fan-out) so no caller ever sees live state.

use crate::messages::ServerMessage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport-assigned identifier of a live connection, also the
/// participant id inside a room.
pub type ConnId = Uuid;

/// Per-connection outbound queue. Sends never block; the connection's
/// writer task drains the queue onto the socket.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// One connection's membership of a room
pub struct Participant {
    pub conn_id: ConnId,
    /// Client-chosen opaque id other clients address signaling to
    pub peer_id: String,
    pub name: String,
    pub is_host: bool,
    pub joined_at: Instant,
    pub sender: OutboundSender,
}

impl Participant {
    pub fn new(conn_id: ConnId, peer_id: String, name: &str, sender: OutboundSender) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            fallback_name(conn_id)
        } else {
            trimmed.to_string()
        };

        Self {
            conn_id,
            peer_id,
            name,
            is_host: false,
            joined_at: Instant::now(),
            sender,
        }
    }

    pub fn view(&self) -> ParticipantView {
        ParticipantView {
            id: self.conn_id,
            peer_id: self.peer_id.clone(),
            name: self.name.clone(),
            is_host: self.is_host,
        }
    }
}

/// Deterministic display name for a participant that supplied none
pub fn fallback_name(conn_id: ConnId) -> String {
    let short = conn_id.simple().to_string();
    format!("Guest-{}", &short[..8])
}

/// Immutable participant snapshot, safe to hand across boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: ConnId,
    pub peer_id: String,
    pub name: String,
    pub is_host: bool,
}

/// A named coordination context grouping participants
pub struct Room {
    pub code: String,
    pub host_id: ConnId,
    pub participants: HashMap<ConnId, Participant>,
    pub created_at: Instant,
    pub last_activity: Instant,
}

impl Room {
    /// Create a room with its first participant as host
    pub fn new(code: String, mut host: Participant) -> Self {
        host.is_host = true;
        let host_id = host.conn_id;
        let now = Instant::now();

        let mut participants = HashMap::new();
        participants.insert(host_id, host);

        Self {
            code,
            host_id,
            participants,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Roster snapshot in join order (ties broken by connection id)
    pub fn roster(&self) -> Vec<ParticipantView> {
        let mut members: Vec<&Participant> = self.participants.values().collect();
        members.sort_by_key(|p| (p.joined_at, p.conn_id));
        members.iter().map(|p| p.view()).collect()
    }

    /// Outbound senders of every member except `except`, snapshot for fan-out
    pub fn recipients(&self, except: ConnId) -> Vec<(ConnId, OutboundSender)> {
        self.participants
            .values()
            .filter(|p| p.conn_id != except)
            .map(|p| (p.conn_id, p.sender.clone()))
            .collect()
    }

    /// Resolve a peer id to a participant, unicast-relay addressing
    pub fn find_peer(&self, peer_id: &str) -> Option<&Participant> {
        self.participants.values().find(|p| p.peer_id == peer_id)
    }

    pub fn has_peer_id(&self, peer_id: &str) -> bool {
        self.find_peer(peer_id).is_some()
    }

    /// Promote the oldest-joined remaining participant to host.
    ///
    /// Ties on the join instant break towards the smallest connection id so
    /// election is deterministic. Returns the new host's id, or `None` for
    /// an empty room.
    pub fn elect_host(&mut self) -> Option<ConnId> {
        let new_host = self
            .participants
            .values()
            .map(|p| (p.joined_at, p.conn_id))
            .min()?
            .1;

        for p in self.participants.values_mut() {
            p.is_host = p.conn_id == new_host;
        }
        self.host_id = new_host;
        Some(new_host)
    }
}
