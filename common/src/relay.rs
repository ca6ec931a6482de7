use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::RelayConfig,
    hardware::{GpioPort, HardwareError, Level},
    types::RelayState,
};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay {index} does not exist ({count} configured)")]
    UnknownRelay { index: usize, count: usize },
    #[error("failed to initialize relay {index} on gpio {line}: {source}")]
    Init {
        index: usize,
        line: u32,
        #[source]
        source: HardwareError,
    },
    #[error("failed to drive relay {index} on gpio {line}: {source}")]
    Write {
        index: usize,
        line: u32,
        #[source]
        source: HardwareError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayChannel {
    index: usize,
    gpio_line: u32,
    invert_polarity: bool,
    logical_state: RelayState,
}

impl RelayChannel {
    pub fn new(index: usize, gpio_line: u32, invert_polarity: bool) -> Self {
        Self {
            index,
            gpio_line,
            invert_polarity,
            logical_state: RelayState::Off,
        }
    }

    pub fn logical_state(&self) -> RelayState {
        self.logical_state
    }

    pub fn hardware_level(&self, desired: RelayState) -> Level {
        if self.invert_polarity {
            desired.inverted().into()
        } else {
            desired.into()
        }
    }
}

/// The relay channels of the device together with the GPIO backend driving
/// them. The logical state of each channel is the last commanded value and
/// is never read back from the hardware.
#[derive(Debug)]
pub struct ActuatorBank<G> {
    gpio: G,
    channels: Vec<RelayChannel>,
}

impl<G: GpioPort> ActuatorBank<G> {
    pub fn new(gpio: G, channels: Vec<RelayChannel>) -> Self {
        Self { gpio, channels }
    }

    pub fn from_config(gpio: G, relays: &[RelayConfig]) -> Self {
        let channels = relays
            .iter()
            .enumerate()
            .map(|(index, relay)| RelayChannel::new(index, relay.gpio, relay.invert))
            .collect();
        Self::new(gpio, channels)
    }

    /// Puts every line into output mode at the deasserted level. Any line that
    /// cannot be configured aborts initialization.
    pub fn initialize(&mut self) -> Result<(), RelayError> {
        for channel in &mut self.channels {
            let index = channel.index;
            let line = channel.gpio_line;
            info!("initializing relay {} (GPIO {line})...", index + 1);

            let level = channel.hardware_level(RelayState::Off);
            self.gpio
                .configure_output(line)
                .and_then(|()| self.gpio.write_line(line, level))
                .map_err(|source| RelayError::Init {
                    index,
                    line,
                    source,
                })?;
            channel.logical_state = RelayState::Off;
        }
        Ok(())
    }

    /// Drives relay `index` to `desired`. The cached state is updated even if
    /// the hardware write fails.
    pub fn set_state(&mut self, index: usize, desired: RelayState) -> Result<(), RelayError> {
        let count = self.channels.len();
        let channel = self
            .channels
            .get_mut(index)
            .ok_or(RelayError::UnknownRelay { index, count })?;

        channel.logical_state = desired;
        let line = channel.gpio_line;
        let level = channel.hardware_level(desired);
        info!("setting relay {} (GPIO {line}) to {desired}...", index + 1);
        if channel.invert_polarity {
            info!("inverted {desired} to {}", desired.inverted());
        }
        info!("driving GPIO {line} {level}");

        self.gpio.write_line(line, level).map_err(|source| {
            warn!("relay {} (GPIO {line}) write failed: {source}", index + 1);
            RelayError::Write {
                index,
                line,
                source,
            }
        })
    }

    pub fn get_state(&self, index: usize) -> Result<RelayState, RelayError> {
        self.channels
            .get(index)
            .map(RelayChannel::logical_state)
            .ok_or(RelayError::UnknownRelay {
                index,
                count: self.channels.len(),
            })
    }

    pub fn states(&self) -> impl Iterator<Item = (usize, RelayState)> + '_ {
        self.channels
            .iter()
            .map(|channel| (channel.index, channel.logical_state))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingGpio {
        configured: Vec<u32>,
        writes: Vec<(u32, Level)>,
        broken_lines: HashSet<u32>,
    }

    impl RecordingGpio {
        fn broken(lines: &[u32]) -> Self {
            Self {
                broken_lines: lines.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn last_level(&self, line: u32) -> Option<Level> {
            self.writes
                .iter()
                .rev()
                .find(|(written, _)| *written == line)
                .map(|(_, level)| *level)
        }
    }

    impl GpioPort for RecordingGpio {
        fn configure_output(&mut self, line: u32) -> Result<(), HardwareError> {
            if self.broken_lines.contains(&line) {
                return Err(HardwareError::InvalidLine {
                    line,
                    reason: "unavailable".to_string(),
                });
            }
            self.configured.push(line);
            Ok(())
        }

        fn write_line(&mut self, line: u32, level: Level) -> Result<(), HardwareError> {
            if self.broken_lines.contains(&line) {
                return Err(HardwareError::Bus {
                    device: format!("gpio {line}"),
                    reason: "write rejected".to_string(),
                });
            }
            self.writes.push((line, level));
            Ok(())
        }
    }

    fn bank(invert: bool) -> ActuatorBank<RecordingGpio> {
        ActuatorBank::from_config(
            RecordingGpio::default(),
            &[
                RelayConfig { gpio: 11, invert },
                RelayConfig { gpio: 13, invert },
            ],
        )
    }

    #[test]
    fn polarity_table() {
        let cases = [
            (RelayState::Off, false, Level::Low),
            (RelayState::On, false, Level::High),
            (RelayState::Off, true, Level::High),
            (RelayState::On, true, Level::Low),
        ];

        for (desired, invert, expected) in cases {
            let mut bank = bank(invert);
            bank.initialize().unwrap();
            bank.set_state(0, desired).unwrap();

            assert_eq!(
                bank.gpio().last_level(11),
                Some(expected),
                "desired={desired} invert={invert}"
            );
            assert_eq!(bank.get_state(0).unwrap(), desired);
        }
    }

    #[test]
    fn corrected_level_follows_polarity() {
        let plain = RelayChannel::new(0, 11, false);
        let inverted = RelayChannel::new(1, 13, true);

        assert_eq!(plain.hardware_level(RelayState::On).to_string(), "high");
        assert_eq!(inverted.hardware_level(RelayState::On).to_string(), "low");
        assert_eq!(inverted.hardware_level(RelayState::Off).to_string(), "high");
    }

    #[test]
    fn initialize_drives_deasserted_level() {
        let mut bank = ActuatorBank::from_config(
            RecordingGpio::default(),
            &[
                RelayConfig {
                    gpio: 11,
                    invert: false,
                },
                RelayConfig {
                    gpio: 13,
                    invert: true,
                },
            ],
        );
        bank.initialize().unwrap();

        assert_eq!(bank.gpio().configured, vec![11, 13]);
        assert_eq!(bank.gpio().last_level(11), Some(Level::Low));
        assert_eq!(bank.gpio().last_level(13), Some(Level::High));
        assert_eq!(
            bank.states().collect::<Vec<_>>(),
            vec![(0, RelayState::Off), (1, RelayState::Off)]
        );
    }

    #[test]
    fn initialize_fails_on_unconfigurable_line() {
        let mut bank = ActuatorBank::from_config(
            RecordingGpio::broken(&[13]),
            &[
                RelayConfig {
                    gpio: 11,
                    invert: false,
                },
                RelayConfig {
                    gpio: 13,
                    invert: false,
                },
            ],
        );

        let err = bank.initialize().unwrap_err();
        assert!(matches!(err, RelayError::Init { index: 1, line: 13, .. }));
    }

    #[test]
    fn cached_state_follows_failed_writes() {
        let mut bank = ActuatorBank::new(
            RecordingGpio::broken(&[7]),
            vec![RelayChannel::new(0, 7, false)],
        );

        let err = bank.set_state(0, RelayState::On).unwrap_err();

        assert!(matches!(err, RelayError::Write { index: 0, line: 7, .. }));
        assert_eq!(bank.get_state(0).unwrap(), RelayState::On);
    }

    #[test]
    fn get_state_returns_last_write() {
        let mut bank = bank(false);
        bank.initialize().unwrap();

        bank.set_state(1, RelayState::On).unwrap();
        bank.set_state(1, RelayState::Off).unwrap();
        bank.set_state(1, RelayState::On).unwrap();

        assert_eq!(bank.get_state(1).unwrap(), RelayState::On);
        assert_eq!(bank.get_state(0).unwrap(), RelayState::Off);
    }

    #[test]
    fn unknown_relay_is_reported() {
        let mut bank = bank(false);

        assert!(matches!(
            bank.set_state(5, RelayState::On),
            Err(RelayError::UnknownRelay { index: 5, count: 2 })
        ));
        assert!(bank.get_state(2).is_err());
    }
}
