// ============================
// signaling-lib/src/websocket.rs
// ============================
//! Per-connection message handling.
//!
//! A `WebSocketHandler` is instantiated for every live connection and owns
//! that connection's room binding. It routes each inbound message kind to
//! its handler, enforcing the in-a-room preconditions. Join failures are
//! answered with a `room-error`; every other out-of-context or malformed
//! message is logged and dropped, since a client that missequences the
//! protocol gains nothing from being told so.
//!
//! All outbound delivery goes through unbounded per-connection queues, so no
//! handler ever blocks on a slow recipient. Fan-out works on recipient
//! snapshots the registry captured under the room lock; by the time
//! messages are sent, no lock is held.

use crate::error::RoomErrorCode;
use crate::messages::{ClientMessage, ServerMessage};
use crate::metrics::{
    CHAT_MESSAGES, ROOM_CREATED, ROOM_DELETED, ROOM_JOINED, SIGNAL_DROPPED, SIGNAL_RELAYED,
};
use crate::registry::JoinOutcome;
use crate::room::{ConnId, OutboundSender, Participant};
use crate::validation::validate_join_request;
use crate::AppState;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The room binding a connection acquires on a successful join
pub struct Membership {
    pub room_code: String,
    pub peer_id: String,
    pub name: String,
}

/// WebSocket handler for processing one connection's messages
pub struct WebSocketHandler {
    state: Arc<AppState>,
    conn_id: ConnId,
    tx: OutboundSender,
    membership: Option<Membership>,
}

impl WebSocketHandler {
    pub fn new(state: Arc<AppState>, conn_id: ConnId, tx: OutboundSender) -> Self {
        Self {
            state,
            conn_id,
            tx,
            membership: None,
        }
    }

    pub fn conn_id(&self) -> ConnId {
        self.conn_id
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    /// Parse and dispatch one inbound text frame
    pub fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => {
                debug!(conn_id = %self.conn_id, error = %e, "dropping malformed frame");
            },
        }
    }

    /// Route one inbound message to its handler
    pub fn handle_message(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom {
                room_code,
                peer_id,
                name,
                is_host,
            } => self.handle_join(&room_code, &peer_id, &name, is_host),

            ClientMessage::LeaveRoom => self.handle_leave(),

            ClientMessage::WebrtcOffer { to, offer } => {
                let Some(from) = self.own_peer_id("webrtc-offer") else {
                    return;
                };
                let target = to.clone();
                self.relay_to(&target, ServerMessage::WebrtcOffer { to, from, offer });
            },

            ClientMessage::WebrtcAnswer { to, answer } => {
                let Some(from) = self.own_peer_id("webrtc-answer") else {
                    return;
                };
                let target = to.clone();
                self.relay_to(&target, ServerMessage::WebrtcAnswer { to, from, answer });
            },

            ClientMessage::WebrtcIceCandidate { to, candidate } => {
                let Some(from) = self.own_peer_id("webrtc-ice-candidate") else {
                    return;
                };
                let target = to.clone();
                self.relay_to(&target, ServerMessage::WebrtcIceCandidate { to, from, candidate });
            },

            ClientMessage::MediaState {
                video_enabled,
                audio_enabled,
                screen_sharing,
            } => self.handle_media_state(video_enabled, audio_enabled, screen_sharing),

            ClientMessage::ChatMessage { message } => self.handle_chat(&message),

            ClientMessage::ScreenShareStart => self.handle_screen_share(true),
            ClientMessage::ScreenShareStop => self.handle_screen_share(false),
        }
    }

    /// Departure path shared by `leave-room` and transport disconnect.
    /// Idempotent: a second call finds no membership and does nothing.
    pub fn handle_disconnect(&mut self) {
        self.departure();
    }

    fn handle_join(&mut self, room_code: &str, peer_id: &str, name: &str, is_host: bool) {
        if self.membership.is_some() {
            self.send_to_self(ServerMessage::room_error(RoomErrorCode::AlreadyInRoom));
            return;
        }

        if let Err(e) = validate_join_request(room_code, peer_id, name) {
            self.send_to_self(ServerMessage::RoomError {
                code: e.code(),
                message: e.to_string(),
            });
            return;
        }

        let participant = Participant::new(
            self.conn_id,
            peer_id.trim().to_string(),
            name,
            self.tx.clone(),
        );

        let result = if is_host {
            self.state.registry.create(room_code, participant)
        } else {
            self.state.registry.join(room_code, participant)
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                info!(conn_id = %self.conn_id, room_code, error = %e, "join rejected");
                self.send_to_self(ServerMessage::room_error(e.code()));
                return;
            },
        };

        self.admit(outcome, is_host);
    }

    fn admit(&mut self, outcome: JoinOutcome, created: bool) {
        self.membership = Some(Membership {
            room_code: outcome.room_code.clone(),
            peer_id: outcome.joined.peer_id.clone(),
            name: outcome.joined.name.clone(),
        });

        info!(
            conn_id = %self.conn_id,
            room_code = %outcome.room_code,
            peer_id = %outcome.joined.peer_id,
            is_host = outcome.joined.is_host,
            "participant joined room"
        );
        if created {
            counter!(ROOM_CREATED).increment(1);
        }
        counter!(ROOM_JOINED).increment(1);

        self.send_to_self(ServerMessage::RoomJoined {
            room_code: outcome.room_code,
            is_host: outcome.joined.is_host,
            participants: outcome.roster.clone(),
        });

        if !outcome.already_present {
            self.fan_out(
                &outcome.recipients,
                ServerMessage::ParticipantJoined {
                    participant: outcome.joined,
                },
            );
            self.fan_out(
                &outcome.recipients,
                ServerMessage::ParticipantsUpdate {
                    participants: outcome.roster,
                },
            );
        }
    }

    fn handle_leave(&mut self) {
        if self.membership.is_none() {
            debug!(conn_id = %self.conn_id, "leave-room outside a room, dropping");
            return;
        }
        self.departure();
        self.send_to_self(ServerMessage::RoomLeft);
    }

    fn departure(&mut self) {
        let Some(membership) = self.membership.take() else {
            return;
        };

        let Some(outcome) = self
            .state
            .registry
            .leave(&membership.room_code, self.conn_id)
        else {
            return;
        };

        info!(
            conn_id = %self.conn_id,
            room_code = %outcome.room_code,
            was_host = outcome.was_host,
            "participant left room"
        );

        if outcome.room_deleted {
            counter!(ROOM_DELETED).increment(1);
            info!(room_code = %outcome.room_code, "room empty, deleted");
            return;
        }

        if let Some(new_host) = outcome.new_host {
            info!(room_code = %outcome.room_code, %new_host, "host reassigned");
        }

        self.fan_out(
            &outcome.recipients,
            ServerMessage::ParticipantLeft {
                participant_id: outcome.removed.id,
                peer_id: outcome.removed.peer_id.clone(),
            },
        );
        self.fan_out(
            &outcome.recipients,
            ServerMessage::ParticipantsUpdate {
                participants: outcome.roster,
            },
        );
    }

    /// Deliver a negotiation fragment to exactly one addressee in the
    /// sender's room. The `from` field was stamped by the caller from this
    /// connection's participant record, never from the inbound payload.
    fn relay_to(&self, to: &str, msg: ServerMessage) {
        let Some(membership) = &self.membership else {
            return;
        };

        match self.state.registry.relay_target(&membership.room_code, to) {
            Some((_, sender)) => {
                if sender.send(msg).is_err() {
                    debug!(conn_id = %self.conn_id, to, "relay addressee disconnected");
                }
                counter!(SIGNAL_RELAYED).increment(1);
                self.state.registry.touch(&membership.room_code);
            },
            None => {
                warn!(
                    conn_id = %self.conn_id,
                    room_code = %membership.room_code,
                    to,
                    "relay addressee not in room, dropping"
                );
                counter!(SIGNAL_DROPPED).increment(1);
            },
        }
    }

    fn handle_media_state(
        &mut self,
        video_enabled: bool,
        audio_enabled: bool,
        screen_sharing: Option<bool>,
    ) {
        let Some(membership) = &self.membership else {
            debug!(conn_id = %self.conn_id, "media-state outside a room, dropping");
            return;
        };

        let msg = ServerMessage::MediaStateChanged {
            participant_id: self.conn_id,
            peer_id: membership.peer_id.clone(),
            video_enabled,
            audio_enabled,
            screen_sharing,
        };

        let recipients = self
            .state
            .registry
            .recipients_of(&membership.room_code, self.conn_id);
        self.state.registry.touch(&membership.room_code);
        self.fan_out(&recipients, msg);
    }

    fn handle_chat(&mut self, message: &str) {
        let Some(membership) = &self.membership else {
            debug!(conn_id = %self.conn_id, "chat-message outside a room, dropping");
            return;
        };

        let trimmed = message.trim();
        if trimmed.is_empty() {
            debug!(conn_id = %self.conn_id, "empty chat message, dropping");
            return;
        }
        let text: String = trimmed
            .chars()
            .take(self.state.settings.room.max_chat_length)
            .collect();

        let msg = ServerMessage::ChatMessage {
            from: self.conn_id,
            from_name: membership.name.clone(),
            message: text,
            timestamp: Utc::now().timestamp_millis(),
        };

        let recipients = self
            .state
            .registry
            .recipients_of(&membership.room_code, self.conn_id);
        self.state.registry.touch(&membership.room_code);
        counter!(CHAT_MESSAGES).increment(1);
        self.fan_out(&recipients, msg);
    }

    fn handle_screen_share(&mut self, started: bool) {
        let Some(membership) = &self.membership else {
            debug!(conn_id = %self.conn_id, "screen-share outside a room, dropping");
            return;
        };

        let msg = if started {
            ServerMessage::ScreenShareStarted {
                participant_id: self.conn_id,
                peer_id: membership.peer_id.clone(),
            }
        } else {
            ServerMessage::ScreenShareStopped {
                participant_id: self.conn_id,
                peer_id: membership.peer_id.clone(),
            }
        };

        let recipients = self
            .state
            .registry
            .recipients_of(&membership.room_code, self.conn_id);
        self.state.registry.touch(&membership.room_code);
        self.fan_out(&recipients, msg);
    }

    fn own_peer_id(&self, kind: &str) -> Option<String> {
        match &self.membership {
            Some(m) => Some(m.peer_id.clone()),
            None => {
                debug!(conn_id = %self.conn_id, kind, "signaling outside a room, dropping");
                None
            },
        }
    }

    /// Fire-and-forget delivery to a recipient snapshot. A receiver whose
    /// connection died between snapshot and send simply misses the event.
    fn fan_out(&self, recipients: &[(ConnId, OutboundSender)], msg: ServerMessage) {
        for (conn_id, sender) in recipients {
            if sender.send(msg.clone()).is_err() {
                debug!(recipient = %conn_id, "recipient gone during fan-out");
            }
        }
    }

    fn send_to_self(&self, msg: ServerMessage) {
        if self.tx.send(msg).is_err() {
            debug!(conn_id = %self.conn_id, "connection closed before reply");
        }
    }
}
