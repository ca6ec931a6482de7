//! One-wire thermal sensors through the kernel `w1-therm` driver.
//!
//! Each sensor appears as `<devices_dir>/<id>/w1_slave` with two lines: the
//! scratchpad plus a CRC verdict, then the scratchpad plus `t=<millidegrees>`.

use std::{io::ErrorKind, path::PathBuf};

use bricks_common::{HardwareError, OneWirePort};

// DS18B20 power-on reset value; seen when the conversion never ran.
const RESET_MILLIDEGREES: i64 = 85_000;

#[derive(Debug, Clone)]
pub struct SysfsOneWire {
    devices_dir: PathBuf,
}

impl SysfsOneWire {
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: devices_dir.into(),
        }
    }

    fn slave_path(&self, sensor_id: &str) -> PathBuf {
        self.devices_dir.join(sensor_id).join("w1_slave")
    }
}

impl OneWirePort for SysfsOneWire {
    fn read_temperature(&mut self, sensor_id: &str) -> Result<f64, HardwareError> {
        let device = format!("w1 device {sensor_id}");
        let raw = std::fs::read_to_string(self.slave_path(sensor_id)).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                HardwareError::NotFound {
                    device: device.clone(),
                }
            } else {
                HardwareError::Io {
                    device: device.clone(),
                    source,
                }
            }
        })?;

        parse_w1_slave(&raw).map_err(|reason| HardwareError::InvalidData { device, reason })
    }
}

pub fn parse_w1_slave(raw: &str) -> Result<f64, String> {
    let mut lines = raw.lines();
    let crc_line = lines.next().ok_or("empty w1_slave file")?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(format!("crc check failed: {}", crc_line.trim()));
    }

    let data_line = lines.next().ok_or("missing temperature line")?;
    let (_, millidegrees) = data_line
        .rsplit_once("t=")
        .ok_or_else(|| format!("no temperature in {}", data_line.trim()))?;
    let millidegrees: i64 = millidegrees
        .trim()
        .parse()
        .map_err(|err| format!("bad temperature value {millidegrees:?}: {err}"))?;

    if millidegrees == RESET_MILLIDEGREES {
        return Err("sensor returned its power-on reset value".to_string());
    }
    Ok(millidegrees as f64 / 1000.0)
}
