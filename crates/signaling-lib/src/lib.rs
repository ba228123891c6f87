// ============================
// signaling-lib/src/lib.rs
// ============================
//! Core library for the huddle signaling hub.
//!
//! The hub is a coordination plane for browser peers: it groups connections
//! into rooms, relays opaque WebRTC negotiation fragments between named
//! peers, fans presence/chat/media-state events out to room members, and
//! evicts rooms that have gone idle. Media never passes through it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod room;
pub mod validation;
pub mod websocket;
pub mod ws_router;

use crate::config::Settings;
use crate::registry::RoomRegistry;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide room registry, the only shared mutable structure
    pub registry: Arc<RoomRegistry>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(settings.room.max_participants)),
            settings: Arc::new(settings),
        }
    }
}
