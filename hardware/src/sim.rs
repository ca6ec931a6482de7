use std::collections::HashMap;

use bricks_common::{GpioPort, HardwareError, Level, ThermocouplePort};
use tracing::debug;

/// In-memory GPIO for hosts without relay hardware. Lines must be configured
/// before they can be written, like on the real board.
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    levels: HashMap<u32, Level>,
}

impl SimulatedGpio {
    pub fn level(&self, line: u32) -> Option<Level> {
        self.levels.get(&line).copied()
    }
}

impl GpioPort for SimulatedGpio {
    fn configure_output(&mut self, line: u32) -> Result<(), HardwareError> {
        debug!("simulated gpio {line} configured as output");
        self.levels.entry(line).or_insert(Level::Low);
        Ok(())
    }

    fn write_line(&mut self, line: u32, level: Level) -> Result<(), HardwareError> {
        let slot = self
            .levels
            .get_mut(&line)
            .ok_or(HardwareError::NotConfigured { line })?;
        debug!("simulated gpio {line} -> {level:?}");
        *slot = level;
        Ok(())
    }
}

/// Thermocouple bus answering every address with a fixed hot junction value.
#[derive(Debug, Clone)]
pub struct SimulatedThermocouple {
    celsius: f64,
}

impl SimulatedThermocouple {
    pub fn new(celsius: f64) -> Self {
        Self { celsius }
    }
}

impl Default for SimulatedThermocouple {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl ThermocouplePort for SimulatedThermocouple {
    type Device = u16;

    fn open(&mut self, address: u16) -> Result<u16, HardwareError> {
        Ok(address)
    }

    fn read_hot_junction(&mut self, device: &mut u16) -> Result<f64, HardwareError> {
        debug!("simulated mcp9600 {device:#04x} -> {}", self.celsius);
        Ok(self.celsius)
    }
}
