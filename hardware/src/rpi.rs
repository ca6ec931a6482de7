//! Raspberry Pi relay lines through the BCM GPIO peripheral.

use std::collections::HashMap;

use bricks_common::{GpioPort, HardwareError, Level};
use rppal::gpio::{Gpio, Level as PinLevel, OutputPin};
use tracing::debug;

pub struct RpiGpio {
    gpio: Gpio,
    outputs: HashMap<u32, OutputPin>,
}

impl RpiGpio {
    pub fn new() -> Result<Self, HardwareError> {
        let gpio = Gpio::new().map_err(|err| HardwareError::Bus {
            device: "gpio".to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            gpio,
            outputs: HashMap::new(),
        })
    }
}

impl GpioPort for RpiGpio {
    fn configure_output(&mut self, line: u32) -> Result<(), HardwareError> {
        let bcm = u8::try_from(line).map_err(|_| HardwareError::InvalidLine {
            line,
            reason: "not a bcm line number".to_string(),
        })?;
        let pin = self.gpio.get(bcm).map_err(|err| HardwareError::InvalidLine {
            line,
            reason: err.to_string(),
        })?;

        let mut output = pin.into_output_low();
        // Relays keep their state if the agent exits; the next start deasserts them.
        output.set_reset_on_drop(false);
        debug!("gpio {line} configured as output");
        self.outputs.insert(line, output);
        Ok(())
    }

    fn write_line(&mut self, line: u32, level: Level) -> Result<(), HardwareError> {
        let output = self
            .outputs
            .get_mut(&line)
            .ok_or(HardwareError::NotConfigured { line })?;
        output.write(match level {
            Level::Low => PinLevel::Low,
            Level::High => PinLevel::High,
        });
        Ok(())
    }
}
