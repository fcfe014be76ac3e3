//! Gateway configuration (`global_conf.json`) as shown in Info mode.
//!
//! Only the fields the panel displays are validated. Everything else in the
//! document belongs to the packet forwarder and is ignored here.

#[cfg(test)]
mod tests;

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HZ_PER_MHZ: f64 = 1_000_000.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed gateway config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("gateway config is missing `{0}`")]
    MissingField(&'static str),
    #[error("gateway config lists no servers")]
    NoServers,
}

impl ConfigError {
    /// Fits on one line of the status display.
    pub fn short_reason(&self) -> &'static str {
        match self {
            ConfigError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                "file not found"
            }
            ConfigError::Io { .. } => "unreadable",
            ConfigError::Parse(_) => "malformed JSON",
            ConfigError::MissingField(_) => "missing field",
            ConfigError::NoServers => "no servers",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "SX127x_conf")]
    radio: Option<RawRadio>,
    gateway_conf: Option<RawGateway>,
}

#[derive(Debug, Deserialize)]
struct RawRadio {
    freq: Option<u64>,
    spread_factor: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawGateway {
    name: Option<String>,
    servers: Option<Vec<ServerEntry>>,
}

/// Upstream network server entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerEntry {
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Validated view of the gateway document. Loaded fresh on every Info press.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub radio_frequency_hz: u64,
    pub spread_factor: u8,
    pub gateway_name: String,
    /// Non-empty after loading.
    pub servers: Vec<ServerEntry>,
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawDocument = serde_json::from_str(contents)?;
        let radio = raw.radio.ok_or(ConfigError::MissingField("SX127x_conf"))?;
        let gateway = raw
            .gateway_conf
            .ok_or(ConfigError::MissingField("gateway_conf"))?;
        let radio_frequency_hz = radio
            .freq
            .ok_or(ConfigError::MissingField("SX127x_conf.freq"))?;
        let spread_factor = radio
            .spread_factor
            .ok_or(ConfigError::MissingField("SX127x_conf.spread_factor"))?;
        let gateway_name = gateway
            .name
            .ok_or(ConfigError::MissingField("gateway_conf.name"))?;
        let servers = gateway
            .servers
            .ok_or(ConfigError::MissingField("gateway_conf.servers"))?;
        if servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        Ok(Self {
            radio_frequency_hz,
            spread_factor,
            gateway_name,
            servers,
        })
    }

    pub fn frequency_mhz(&self) -> f64 {
        self.radio_frequency_hz as f64 / HZ_PER_MHZ
    }

    /// Shortest decimal with at least one fractional digit: `915.0`, `868.1`.
    pub fn frequency_label(&self) -> String {
        format!("{:?}", self.frequency_mhz())
    }

    /// The server the panel shows; the forwarder also treats the first entry as primary.
    pub fn primary_server(&self) -> Result<&ServerEntry, ConfigError> {
        self.servers.first().ok_or(ConfigError::NoServers)
    }
}
