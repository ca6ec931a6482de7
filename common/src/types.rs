use std::fmt;

pub const SENTINEL_TEMPERATURE: f64 = -42.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RelayState {
    #[default]
    Off,
    On,
}

impl RelayState {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            _ => None,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorFamily {
    OneWire,
    I2cThermocouple,
}

impl SensorFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneWire => "w1",
            Self::I2cThermocouple => "mcp9600",
        }
    }
}

/// Identity of one temperature sensor: the family it is read through plus the
/// family-specific id (a bus address string or an I2C address).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SensorRef {
    OneWire(String),
    Thermocouple(u16),
}

impl SensorRef {
    pub fn family(&self) -> SensorFamily {
        match self {
            Self::OneWire(_) => SensorFamily::OneWire,
            Self::Thermocouple(_) => SensorFamily::I2cThermocouple,
        }
    }
}

impl fmt::Display for SensorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneWire(id) => write!(f, "{} device {id}", self.family().as_str()),
            Self::Thermocouple(address) => {
                write!(f, "{} device {address:#04x}", self.family().as_str())
            }
        }
    }
}

/// Outcome of a single sensor read. Only `Live` comes from the hardware in
/// this cycle; the other two are substitutes reported in its place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Live(f64),
    LastKnown(f64),
    Sentinel,
}

impl Temperature {
    pub fn value(self) -> f64 {
        match self {
            Self::Live(value) | Self::LastKnown(value) => value,
            Self::Sentinel => SENTINEL_TEMPERATURE,
        }
    }
}

/// Readings keep a decimal point even when whole (`25.0`); the sentinel is
/// sent as the integer `-42`.
impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(value) | Self::LastKnown(value)
                if value.is_finite() && value.fract() == 0.0 =>
            {
                write!(f, "{value:.1}")
            }
            Self::Live(value) | Self::LastKnown(value) => write!(f, "{value}"),
            Self::Sentinel => write!(f, "{}", SENTINEL_TEMPERATURE as i64),
        }
    }
}
