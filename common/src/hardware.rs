//! Capability interfaces the agent core drives hardware through.
//!
//! Each trait is deliberately narrow so that a Raspberry Pi backend, a Linux
//! sysfs backend, and a simulated backend can all sit behind it.

use std::fmt;

use thiserror::Error;

use crate::types::RelayState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl From<RelayState> for Level {
    fn from(state: RelayState) -> Self {
        match state {
            RelayState::Off => Self::Low,
            RelayState::On => Self::High,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("gpio line {line} is not usable: {reason}")]
    InvalidLine { line: u32, reason: String },
    #[error("gpio line {line} has not been configured as an output")]
    NotConfigured { line: u32 },
    #[error("{device} not found")]
    NotFound { device: String },
    #[error("bus error on {device}: {reason}")]
    Bus { device: String, reason: String },
    #[error("invalid data from {device}: {reason}")]
    InvalidData { device: String, reason: String },
    #[error("i/o error on {device}: {source}")]
    Io {
        device: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait GpioPort {
    fn configure_output(&mut self, line: u32) -> Result<(), HardwareError>;

    fn write_line(&mut self, line: u32, level: Level) -> Result<(), HardwareError>;
}

/// Contact-bus thermal sensors addressed by their bus id (e.g. `28-0316a2795bff`).
pub trait OneWirePort {
    fn read_temperature(&mut self, sensor_id: &str) -> Result<f64, HardwareError>;
}

/// I2C thermocouple amplifiers. Opening a device and reading it are separate
/// fallible steps; the device handle is not kept between reads.
pub trait ThermocouplePort {
    type Device;

    fn open(&mut self, address: u16) -> Result<Self::Device, HardwareError>;

    fn read_hot_junction(&mut self, device: &mut Self::Device) -> Result<f64, HardwareError>;
}
