//! Agent configuration.
//!
//! One TOML file holds the sink URL, the durable buffer path, the device
//! owner's identity, the granted capabilities, and the host-bridge source
//! paths. Everything except `sink_url` has a default; an absent `[identity]`
//! table is the identity-absent condition, not an error.

use std::path::PathBuf;

use guardiantrack_protocol::Identity;
use serde::Deserialize;

use crate::capability::{Capability, CapabilitySet};
use crate::sources::location::{DEFAULT_FASTEST_INTERVAL_MS, DEFAULT_UPDATE_INTERVAL_MS};

pub const APP_DIR: &str = "guardiantrack";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const BUFFER_FILENAME: &str = "location-log.csv";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Process-lifetime agent configuration. Read once at startup, never
/// mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// The single remote collection endpoint.
    pub sink_url: String,

    /// Durable sample log location.
    #[serde(default = "default_buffer_path")]
    pub buffer_path: PathBuf,

    #[serde(default)]
    pub identity: Option<IdentityConfig>,

    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Capability grants mirrored from the platform's permission state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilitiesConfig {
    #[serde(default)]
    pub fine_location: bool,
    #[serde(default)]
    pub coarse_location: bool,
    #[serde(default)]
    pub read_call_log: bool,
    #[serde(default)]
    pub read_sms: bool,
}

/// Host-bridge snapshot files for the two harvesters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub call_log_path: Option<PathBuf>,
    #[serde(default)]
    pub message_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_update_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_fastest_interval_ms")]
    pub fastest_interval_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MS,
        }
    }
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

fn default_fastest_interval_ms() -> u64 {
    DEFAULT_FASTEST_INTERVAL_MS
}

fn default_buffer_path() -> PathBuf {
    data_dir().join(BUFFER_FILENAME)
}

/// Application data directory, `~/.local/share/guardiantrack` or the
/// platform equivalent. Falls back to a relative directory when the host
/// exposes no data dir.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default config path, `~/.config/guardiantrack/config.toml` or the
/// platform equivalent.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILENAME)
}

impl AgentConfig {
    /// Load and parse the TOML config at `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured identity, if the `[identity]` table is present.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.as_ref().map(|identity| Identity {
            id: identity.id,
            name: identity.name.clone(),
            phone: identity.phone.clone(),
            email: identity.email.clone(),
        })
    }

    /// The granted capability set.
    pub fn capability_set(&self) -> CapabilitySet {
        let mut granted = Vec::new();
        if self.capabilities.fine_location {
            granted.push(Capability::FineLocation);
        }
        if self.capabilities.coarse_location {
            granted.push(Capability::CoarseLocation);
        }
        if self.capabilities.read_call_log {
            granted.push(Capability::ReadCallLog);
        }
        if self.capabilities.read_sms {
            granted.push(Capability::ReadSms);
        }
        CapabilitySet::new(granted)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use crate::capability::CapabilityChecker;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: AgentConfig = toml::from_str(r#"sink_url = "https://sink.example/collect""#)
            .expect("minimal config parses");
        assert_eq!(config.sink_url, "https://sink.example/collect");
        assert_eq!(config.location.interval_ms, 30_000);
        assert_eq!(config.location.fastest_interval_ms, 15_000);
        assert!(config.identity().is_none());
        assert!(
            !config
                .capability_set()
                .has_capability(Capability::FineLocation)
        );
    }

    #[test]
    fn full_config_parses() {
        let config: AgentConfig = toml::from_str(
            r#"
            sink_url = "https://sink.example/collect"
            buffer_path = "/var/lib/guardiantrack/location-log.csv"

            [identity]
            id = 7
            name = "A"
            phone = "555"
            email = "a@x"

            [capabilities]
            fine_location = true
            read_sms = true

            [sources]
            call_log_path = "/var/lib/guardiantrack/calls.jsonl"

            [location]
            interval_ms = 60000
            fastest_interval_ms = 20000
            "#,
        )
        .expect("full config parses");

        let identity = config.identity().expect("identity table present");
        assert!(identity.is_complete());
        assert_eq!(identity.id, 7);

        let capabilities = config.capability_set();
        assert!(capabilities.has_capability(Capability::FineLocation));
        assert!(capabilities.has_capability(Capability::ReadSms));
        assert!(!capabilities.has_capability(Capability::ReadCallLog));

        assert_eq!(config.location.interval_ms, 60_000);
        assert!(config.sources.call_log_path.is_some());
        assert!(config.sources.message_log_path.is_none());
    }

    #[test]
    fn missing_sink_url_is_a_parse_error() {
        let result: Result<AgentConfig, _> = toml::from_str("[capabilities]\nread_sms = true");
        assert!(result.is_err());
    }
}
