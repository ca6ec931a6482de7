//! MCP9600 thermocouple amplifier register map and conversions.

pub const REG_HOT_JUNCTION: u8 = 0x00;
pub const REG_DEVICE_ID: u8 = 0x20;
pub const DEVICE_ID: u8 = 0x40;

/// Hot junction register: signed big-endian, 1/16 °C per LSB.
pub fn hot_junction_celsius(raw: [u8; 2]) -> f64 {
    f64::from(i16::from_be_bytes(raw)) * 0.0625
}

pub fn is_mcp9600(id_register: [u8; 2]) -> bool {
    id_register[0] == DEVICE_ID
}

#[cfg(feature = "rpi")]
pub use bus::Mcp9600Bus;

#[cfg(feature = "rpi")]
mod bus {
    use bricks_common::{HardwareError, ThermocouplePort};
    use rppal::i2c::I2c;

    use super::{hot_junction_celsius, is_mcp9600, REG_DEVICE_ID, REG_HOT_JUNCTION};

    /// MCP9600 devices on one I2C bus. Every `open` claims the bus anew and
    /// checks the device id register.
    #[derive(Debug, Clone)]
    pub struct Mcp9600Bus {
        bus: u8,
    }

    impl Mcp9600Bus {
        pub fn new(bus: u8) -> Self {
            Self { bus }
        }
    }

    fn bus_error(address: u16, err: rppal::i2c::Error) -> HardwareError {
        HardwareError::Bus {
            device: format!("mcp9600 device {address:#04x}"),
            reason: err.to_string(),
        }
    }

    impl ThermocouplePort for Mcp9600Bus {
        type Device = (u16, I2c);

        fn open(&mut self, address: u16) -> Result<Self::Device, HardwareError> {
            let mut i2c = I2c::with_bus(self.bus).map_err(|err| bus_error(address, err))?;
            i2c.set_slave_address(address)
                .map_err(|err| bus_error(address, err))?;

            let mut id = [0_u8; 2];
            i2c.write_read(&[REG_DEVICE_ID], &mut id)
                .map_err(|err| bus_error(address, err))?;
            if !is_mcp9600(id) {
                return Err(HardwareError::NotFound {
                    device: format!("mcp9600 device {address:#04x} (id register {id:02x?})"),
                });
            }
            Ok((address, i2c))
        }

        fn read_hot_junction(&mut self, device: &mut Self::Device) -> Result<f64, HardwareError> {
            let (address, i2c) = device;
            let mut raw = [0_u8; 2];
            i2c.write_read(&[REG_HOT_JUNCTION], &mut raw)
                .map_err(|err| bus_error(*address, err))?;
            Ok(hot_junction_celsius(raw))
        }
    }
}
