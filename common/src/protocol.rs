//! Wire format of the controller polling protocol.
//!
//! Requests are flat key/value pairs sent as a query string. The response is
//! either the literal `internal.` (device not activated yet) or a JSON object
//! carrying the next poll interval and per-relay directives.

use std::{collections::BTreeMap, time::Duration};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    config::BricksConfig,
    types::{RelayState, Temperature},
};

pub const NOT_ACTIVATED_BODY: &str = "internal.";
pub const BRAND: &str = "oss";
pub const PROTOCOL_VERSION: &str = "0.1";

pub const KEY_TYPE: &str = "type";
pub const KEY_BRAND: &str = "brand";
pub const KEY_VERSION: &str = "version";
pub const KEY_CHIP_ID: &str = "chipid";
pub const KEY_API_KEY: &str = "apikey";
pub const KEY_NEXT_REQUEST_MS: &str = "next_request_ms";

pub fn relay_state_key(index: usize) -> String {
    format!("relay-power-state-{index}")
}

pub fn sensor_temperature_key(index: usize) -> String {
    format!("sensor-temperature-{index}")
}

pub fn relay_directive_key(index: usize) -> String {
    format!("epower-{index}-state")
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("response is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not a json object")]
    NotAnObject,
    #[error("response has no `next_request_ms`")]
    MissingInterval,
    #[error("invalid `next_request_ms` value {0}")]
    InvalidInterval(Value),
    #[error("invalid relay directive `{key}`: {value}")]
    InvalidRelayState { key: String, value: Value },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_type: String,
    pub chip_id: String,
    pub api_key: String,
}

impl DeviceIdentity {
    pub fn from_config(config: &BricksConfig) -> Self {
        Self {
            device_type: config.meta.platform.clone(),
            chip_id: config.device_id.clone(),
            api_key: config.apikey.clone(),
        }
    }
}

/// Outbound report in the order the parameters are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    params: Vec<(String, String)>,
}

impl Report {
    pub fn new(identity: &DeviceIdentity) -> Self {
        let params = vec![
            (KEY_TYPE.to_string(), identity.device_type.clone()),
            (KEY_BRAND.to_string(), BRAND.to_string()),
            (KEY_VERSION.to_string(), PROTOCOL_VERSION.to_string()),
            (KEY_CHIP_ID.to_string(), identity.chip_id.clone()),
            (KEY_API_KEY.to_string(), identity.api_key.clone()),
        ];
        Self { params }
    }

    pub fn push_relay(&mut self, index: usize, state: RelayState) {
        self.params.push((relay_state_key(index), state.to_string()));
    }

    pub fn push_temperature(&mut self, index: usize, temperature: Temperature) {
        self.params
            .push((sensor_temperature_key(index), temperature.to_string()));
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub next_request: Duration,
    relays: BTreeMap<usize, RelayState>,
}

impl Directive {
    pub fn new(next_request: Duration) -> Self {
        Self {
            next_request,
            relays: BTreeMap::new(),
        }
    }

    pub fn with_relay(mut self, index: usize, state: RelayState) -> Self {
        self.relays.insert(index, state);
        self
    }

    /// `None` means the controller sent no directive for this relay.
    pub fn relay(&self, index: usize) -> Option<RelayState> {
        self.relays.get(&index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerResponse {
    NotActivated,
    Directive(Directive),
}

/// Parses a controller response for a device with `relay_count` relays.
/// Directives for relays the device does not have are ignored. The whole
/// body is validated before anything is returned.
pub fn parse_response(
    body: &str,
    relay_count: usize,
) -> Result<ControllerResponse, ProtocolError> {
    if body == NOT_ACTIVATED_BODY {
        return Ok(ControllerResponse::NotActivated);
    }

    let value: Value = serde_json::from_str(body)?;
    let Value::Object(object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let interval = object
        .get(KEY_NEXT_REQUEST_MS)
        .ok_or(ProtocolError::MissingInterval)?;
    let next_request_ms = as_integer(interval)
        .and_then(|ms| u64::try_from(ms).ok())
        .ok_or_else(|| ProtocolError::InvalidInterval(interval.clone()))?;

    let mut directive = Directive::new(Duration::from_millis(next_request_ms));
    for index in 0..relay_count {
        if let Some(state) = relay_directive(&object, index)? {
            directive = directive.with_relay(index, state);
        }
    }
    Ok(ControllerResponse::Directive(directive))
}

fn relay_directive(
    object: &Map<String, Value>,
    index: usize,
) -> Result<Option<RelayState>, ProtocolError> {
    let key = relay_directive_key(index);
    let Some(value) = object.get(&key) else {
        return Ok(None);
    };

    as_integer(value)
        .and_then(|raw| u8::try_from(raw).ok())
        .and_then(RelayState::from_u8)
        .map(Some)
        .ok_or_else(|| ProtocolError::InvalidRelayState {
            key,
            value: value.clone(),
        })
}

/// The controller is not consistent about numeric encoding: integers, whole
/// floats, numeric strings and booleans all occur.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}
