// ============================
// signaling-lib/src/config.rs
// ============================
//! Configuration management for the signaling hub.
//!
//! Settings are loaded from an optional `config/default.toml` file and
//! `HUB_`-prefixed environment variables, with environment taking
//! precedence. Every field has a default so the server starts with no
//! configuration at all.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub room: RoomSettings,
    pub websocket: WebSocketSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Origin whitelist. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoomSettings {
    pub max_participants: usize,
    /// Chat messages are truncated to this many code points.
    pub max_chat_length: usize,
    pub idle_timeout_mins: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebSocketSettings {
    pub ping_interval_secs: u64,
    pub pong_timeout_secs: u64,
}

impl Settings {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("HUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specified path
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("HUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room.idle_timeout_mins * 60)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.room.sweep_interval_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.websocket.ping_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.websocket.pong_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            cors: CorsSettings::default(),
            room: RoomSettings::default(),
            websocket: WebSocketSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_participants: 50,
            max_chat_length: 1000,
            idle_timeout_mins: 60,
            sweep_interval_secs: 300,
        }
    }
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            ping_interval_secs: 25,
            pong_timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Settings::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.room.max_participants, 50);
        assert_eq!(config.room.max_chat_length, 1000);
        assert_eq!(config.room.idle_timeout_mins, 60);
        assert_eq!(config.websocket.ping_interval_secs, 25);
        assert_eq!(config.websocket.pong_timeout_secs, 60);
        assert_eq!(config.cors.allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_duration_accessors() {
        let config = Settings::default();
        assert_eq!(config.idle_timeout(), Duration::from_secs(3600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.ping_interval(), Duration::from_secs(25));
        assert_eq!(config.pong_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_deserialization_falls_back_to_defaults() {
        // A file that only overrides the port keeps every other default
        let config: Settings = Config::builder()
            .add_source(File::from_str(
                "[server]\nport = 9000\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.room, RoomSettings::default());
        assert_eq!(config.websocket, WebSocketSettings::default());
    }
}
