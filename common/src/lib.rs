pub mod config;
pub mod hardware;
pub mod protocol;
pub mod relay;
pub mod sensor;
pub mod types;

pub use config::{AgentSettings, BricksConfig, ConfigError, PinNumbering, RelayConfig};
pub use hardware::{GpioPort, HardwareError, Level, OneWirePort, ThermocouplePort};
pub use protocol::{ControllerResponse, DeviceIdentity, Directive, ProtocolError, Report};
pub use relay::{ActuatorBank, RelayChannel, RelayError};
pub use sensor::SensorReader;
pub use types::{RelayState, SensorFamily, SensorRef, Temperature, SENTINEL_TEMPERATURE};
