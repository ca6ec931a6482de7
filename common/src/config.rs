use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SensorRef;

pub const DEFAULT_ENDPOINT: &str = "https://brewbricks.com/api/iot/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
    },
    #[error("configuration validation failed:\n{details}")]
    Validation { details: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinNumbering {
    /// Physical position on the 40-pin header.
    #[default]
    Board,
    /// Broadcom GPIO line number.
    Bcm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub gpio: u32,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub platform: String,
}

impl Default for DeviceMeta {
    fn default() -> Self {
        Self {
            platform: "RaspberryPi".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub failure_backoff_ms: u64,
    pub initial_interval_ms: u64,
    pub pin_numbering: PinNumbering,
    pub w1_devices_dir: PathBuf,
    pub i2c_bus: u8,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: 30_000,
            failure_backoff_ms: 60_000,
            initial_interval_ms: 60_000,
            pin_numbering: PinNumbering::Board,
            w1_devices_dir: PathBuf::from("/sys/bus/w1/devices"),
            i2c_bus: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BricksConfig {
    pub apikey: String,
    pub device_id: String,
    #[serde(default)]
    pub meta: DeviceMeta,
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
    #[serde(default)]
    pub temperature_sensors_w1: Vec<String>,
    #[serde(default)]
    pub temperature_sensors_mcp9600: Vec<u16>,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl BricksConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse { source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.apikey.trim().is_empty() {
            errors.push("apikey may not be empty".to_string());
        }
        if self.device_id.trim().is_empty() {
            errors.push("device_id may not be empty".to_string());
        }
        if self.agent.endpoint.trim().is_empty() {
            errors.push("agent.endpoint may not be empty".to_string());
        }
        if self.agent.request_timeout_ms == 0 {
            errors.push("agent.request_timeout_ms must be positive".to_string());
        }
        if self.agent.failure_backoff_ms == 0 {
            errors.push("agent.failure_backoff_ms must be positive".to_string());
        }
        if self.agent.initial_interval_ms == 0 {
            errors.push("agent.initial_interval_ms must be positive".to_string());
        }

        let mut lines = HashSet::new();
        for (index, relay) in self.relays.iter().enumerate() {
            if !lines.insert(relay.gpio) {
                errors.push(format!(
                    "relay {index} reuses gpio {} already mapped to another relay",
                    relay.gpio
                ));
            }
        }

        let mut w1_ids = HashSet::new();
        for id in &self.temperature_sensors_w1 {
            if id.trim().is_empty() {
                errors.push("w1 sensor id may not be empty".to_string());
            } else if !w1_ids.insert(id.as_str()) {
                errors.push(format!("duplicate w1 sensor '{id}'"));
            }
        }

        let mut addresses = HashSet::new();
        for &address in &self.temperature_sensors_mcp9600 {
            if address > 0x7f {
                errors.push(format!("mcp9600 address {address:#x} is not a 7-bit i2c address"));
            } else if !addresses.insert(address) {
                errors.push(format!("duplicate mcp9600 address {address:#04x}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation {
                details: errors.join("\n"),
            })
        }
    }

    /// All configured sensors in report order: one-wire first, then thermocouples.
    pub fn sensors(&self) -> Vec<SensorRef> {
        self.temperature_sensors_w1
            .iter()
            .cloned()
            .map(SensorRef::OneWire)
            .chain(
                self.temperature_sensors_mcp9600
                    .iter()
                    .copied()
                    .map(SensorRef::Thermocouple),
            )
            .collect()
    }

    pub fn redacted_apikey(&self) -> String {
        let count = self.apikey.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.apikey.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}
