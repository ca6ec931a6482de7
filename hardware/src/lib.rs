pub mod mcp9600;
pub mod pins;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod sim;
pub mod w1;

pub use pins::{board_to_bcm, PinMap};
pub use sim::{SimulatedGpio, SimulatedThermocouple};
pub use w1::SysfsOneWire;
