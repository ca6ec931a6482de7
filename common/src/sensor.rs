use std::collections::HashMap;

use tracing::{debug, error};

use crate::{
    hardware::{HardwareError, OneWirePort, ThermocouplePort},
    types::{SensorRef, Temperature},
};

/// Reads temperatures across both sensor families. A failed read falls back
/// to the last value that sensor produced, or to the sentinel if it never
/// produced one.
#[derive(Debug)]
pub struct SensorReader<W, T> {
    one_wire: W,
    thermocouple: T,
    last_known: HashMap<SensorRef, f64>,
}

impl<W: OneWirePort, T: ThermocouplePort> SensorReader<W, T> {
    pub fn new(one_wire: W, thermocouple: T) -> Self {
        Self {
            one_wire,
            thermocouple,
            last_known: HashMap::new(),
        }
    }

    pub fn read_temperature(&mut self, sensor: &SensorRef) -> Temperature {
        let reading = match sensor {
            SensorRef::OneWire(id) => self.one_wire.read_temperature(id).inspect_err(|err| {
                error!("could not read temperature for {sensor}: {err}");
            }),
            SensorRef::Thermocouple(address) => self.read_thermocouple(sensor, *address),
        }
        .and_then(|value| check_finite(sensor, value));

        match reading {
            Ok(value) => {
                debug!("{sensor} reads {value}");
                self.last_known.insert(sensor.clone(), value);
                Temperature::Live(value)
            }
            Err(_) => self
                .last_known
                .get(sensor)
                .copied()
                .map_or(Temperature::Sentinel, Temperature::LastKnown),
        }
    }

    pub fn last_known(&self, sensor: &SensorRef) -> Option<f64> {
        self.last_known.get(sensor).copied()
    }

    fn read_thermocouple(
        &mut self,
        sensor: &SensorRef,
        address: u16,
    ) -> Result<f64, HardwareError> {
        let mut device = self.thermocouple.open(address).inspect_err(|err| {
            error!("could not initialise {sensor}: {err}");
        })?;
        self.thermocouple
            .read_hot_junction(&mut device)
            .inspect_err(|err| {
                error!("could not read temperature for {sensor}: {err}");
            })
    }
}

fn check_finite(sensor: &SensorRef, value: f64) -> Result<f64, HardwareError> {
    if value.is_finite() {
        Ok(value)
    } else {
        error!("{sensor} returned non-finite temperature {value}");
        Err(HardwareError::InvalidData {
            device: sensor.to_string(),
            reason: format!("non-finite temperature {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    struct ScriptedOneWire {
        readings: HashMap<String, VecDeque<Result<f64, ()>>>,
    }

    impl ScriptedOneWire {
        fn script(mut self, id: &str, readings: &[Result<f64, ()>]) -> Self {
            self.readings
                .insert(id.to_string(), readings.iter().copied().collect());
            self
        }
    }

    impl OneWirePort for ScriptedOneWire {
        fn read_temperature(&mut self, sensor_id: &str) -> Result<f64, HardwareError> {
            match self
                .readings
                .get_mut(sensor_id)
                .and_then(VecDeque::pop_front)
            {
                Some(Ok(value)) => Ok(value),
                _ => Err(HardwareError::NotFound {
                    device: sensor_id.to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct ScriptedThermocouple {
        absent: Vec<u16>,
        readings: VecDeque<Result<f64, ()>>,
        opened: usize,
    }

    impl ThermocouplePort for ScriptedThermocouple {
        type Device = u16;

        fn open(&mut self, address: u16) -> Result<u16, HardwareError> {
            if self.absent.contains(&address) {
                return Err(HardwareError::NotFound {
                    device: format!("i2c {address:#04x}"),
                });
            }
            self.opened += 1;
            Ok(address)
        }

        fn read_hot_junction(&mut self, device: &mut u16) -> Result<f64, HardwareError> {
            match self.readings.pop_front() {
                Some(Ok(value)) => Ok(value),
                _ => Err(HardwareError::Bus {
                    device: format!("i2c {device:#04x}"),
                    reason: "nack".to_string(),
                }),
            }
        }
    }

    fn w1(id: &str) -> SensorRef {
        SensorRef::OneWire(id.to_string())
    }

    #[test]
    fn never_read_sensor_reports_sentinel() {
        let mut reader =
            SensorReader::new(ScriptedOneWire::default(), ScriptedThermocouple::default());

        let temperature = reader.read_temperature(&w1("28-missing"));

        assert_eq!(temperature, Temperature::Sentinel);
        assert_eq!(temperature.value(), -42.0);
    }

    #[test]
    fn failure_after_success_reports_last_known() {
        let one_wire = ScriptedOneWire::default().script("28-a", &[Ok(21.5), Err(())]);
        let mut reader = SensorReader::new(one_wire, ScriptedThermocouple::default());

        assert_eq!(reader.read_temperature(&w1("28-a")), Temperature::Live(21.5));
        assert_eq!(
            reader.read_temperature(&w1("28-a")),
            Temperature::LastKnown(21.5)
        );
    }

    #[test]
    fn fallback_is_per_sensor_identity() {
        let one_wire = ScriptedOneWire::default()
            .script("28-a", &[Ok(19.0)])
            .script("28-b", &[Err(())]);
        let mut reader = SensorReader::new(one_wire, ScriptedThermocouple::default());

        reader.read_temperature(&w1("28-a"));

        assert_eq!(reader.read_temperature(&w1("28-b")), Temperature::Sentinel);
        assert_eq!(reader.last_known(&w1("28-a")), Some(19.0));
    }

    #[test]
    fn thermocouple_open_and_read_failures_share_fallback() {
        let thermocouple = ScriptedThermocouple {
            absent: vec![0x67],
            readings: VecDeque::from([Ok(64.25), Err(())]),
            opened: 0,
        };
        let mut reader = SensorReader::new(ScriptedOneWire::default(), thermocouple);
        let present = SensorRef::Thermocouple(0x60);
        let absent = SensorRef::Thermocouple(0x67);

        assert_eq!(reader.read_temperature(&present), Temperature::Live(64.25));
        assert_eq!(
            reader.read_temperature(&present),
            Temperature::LastKnown(64.25)
        );
        assert_eq!(reader.read_temperature(&absent), Temperature::Sentinel);
        assert_eq!(reader.thermocouple.opened, 2);
    }

    #[test]
    fn families_do_not_share_cache_entries() {
        let thermocouple = ScriptedThermocouple {
            readings: VecDeque::from([Ok(30.0)]),
            ..ScriptedThermocouple::default()
        };
        let mut reader = SensorReader::new(ScriptedOneWire::default(), thermocouple);

        reader.read_temperature(&SensorRef::Thermocouple(96));

        assert_eq!(reader.read_temperature(&w1("96")), Temperature::Sentinel);
    }

    #[test]
    fn non_finite_reading_counts_as_failure() {
        let one_wire = ScriptedOneWire::default().script("28-a", &[Ok(20.0), Ok(f64::NAN)]);
        let mut reader = SensorReader::new(one_wire, ScriptedThermocouple::default());

        reader.read_temperature(&w1("28-a"));

        assert_eq!(
            reader.read_temperature(&w1("28-a")),
            Temperature::LastKnown(20.0)
        );
    }
}
