use std::time::Duration;

use bricks_common::{
    protocol::{self, ControllerResponse, Directive},
    ActuatorBank, AgentSettings, DeviceIdentity, GpioPort, OneWirePort, ProtocolError,
    RelayError, RelayState, Report, SensorReader, SensorRef, ThermocouplePort,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::transport::{Transport, TransportError};

pub const ACTIVATION_URL: &str = "https://bricks.bierbot.com";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("controller unreachable: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid controller response: {source}")]
    Protocol {
        #[source]
        source: ProtocolError,
        body: String,
    },
    #[error("failed to apply controller directive: {source}")]
    Apply {
        #[source]
        source: RelayError,
        body: String,
    },
}

impl SyncError {
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Protocol { body, .. } | Self::Apply { body, .. } => Some(body),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub failure_backoff: Duration,
    pub initial_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for SyncSettings {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            failure_backoff: Duration::from_millis(settings.failure_backoff_ms),
            initial_interval: Duration::from_millis(settings.initial_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied { next_request: Duration },
    NotActivated { retry_in: Duration },
    Failed { backoff: Duration },
}

impl CycleOutcome {
    pub fn sleep(self) -> Duration {
        match self {
            Self::Applied { next_request } => next_request,
            Self::NotActivated { retry_in } => retry_in,
            Self::Failed { backoff } => backoff,
        }
    }
}

/// Runs report/receive/apply cycles against the controller. The only state
/// carried between cycles is the last poll interval the controller asked for.
#[derive(Debug)]
pub struct SyncClient<X> {
    transport: X,
    identity: DeviceIdentity,
    sensors: Vec<SensorRef>,
    settings: SyncSettings,
    last_interval: Option<Duration>,
}

impl<X: Transport> SyncClient<X> {
    pub fn new(
        transport: X,
        identity: DeviceIdentity,
        sensors: Vec<SensorRef>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            transport,
            identity,
            sensors,
            settings,
            last_interval: None,
        }
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    pub fn last_interval(&self) -> Option<Duration> {
        self.last_interval
    }

    pub async fn cycle<G, W, T>(
        &mut self,
        bank: &mut ActuatorBank<G>,
        reader: &mut SensorReader<W, T>,
    ) -> CycleOutcome
    where
        G: GpioPort,
        W: OneWirePort,
        T: ThermocouplePort,
    {
        info!("starting request");
        match self.exchange(bank, reader).await {
            Ok(outcome) => outcome,
            Err(err) => {
                match err.body() {
                    Some(body) => warn!("failed processing request ({err}): {body}"),
                    None => error!("failed processing request: {err}"),
                }
                CycleOutcome::Failed {
                    backoff: self.settings.failure_backoff,
                }
            }
        }
    }

    pub fn build_report<G, W, T>(
        &self,
        bank: &ActuatorBank<G>,
        reader: &mut SensorReader<W, T>,
    ) -> Report
    where
        G: GpioPort,
        W: OneWirePort,
        T: ThermocouplePort,
    {
        let mut report = Report::new(&self.identity);

        for (index, state) in bank.states() {
            report.push_relay(index, state);
            info!("set relay {index} to {state}");
        }

        for (index, sensor) in self.sensors.iter().enumerate() {
            let temperature = reader.read_temperature(sensor);
            report.push_temperature(index, temperature);
            info!("set tempsensor {index} with id {sensor} to {temperature}");
        }

        report
    }

    async fn exchange<G, W, T>(
        &mut self,
        bank: &mut ActuatorBank<G>,
        reader: &mut SensorReader<W, T>,
    ) -> Result<CycleOutcome, SyncError>
    where
        G: GpioPort,
        W: OneWirePort,
        T: ThermocouplePort,
    {
        let report = self.build_report(bank, reader);
        let response = self.transport.fetch(report.params()).await?;
        if !response.is_success() {
            warn!("controller answered with http status {}", response.status);
        }

        let parsed = protocol::parse_response(&response.body, bank.len());
        let directive = match parsed {
            Ok(ControllerResponse::NotActivated) => {
                info!("please activate this device under {ACTIVATION_URL} > Bricks");
                let retry_in = self.last_interval.unwrap_or(self.settings.initial_interval);
                return Ok(CycleOutcome::NotActivated { retry_in });
            }
            Ok(ControllerResponse::Directive(directive)) => directive,
            Err(source) => {
                return Err(SyncError::Protocol {
                    source,
                    body: response.body,
                })
            }
        };

        self.last_interval = Some(directive.next_request);
        apply_directive(bank, &directive).map_err(|source| SyncError::Apply {
            source,
            body: response.body,
        })?;

        info!("sleeping for {}ms", directive.next_request.as_millis());
        Ok(CycleOutcome::Applied {
            next_request: directive.next_request,
        })
    }
}

/// Every relay gets an explicit state; a relay the controller says nothing
/// about is switched off.
pub fn apply_directive<G: GpioPort>(
    bank: &mut ActuatorBank<G>,
    directive: &Directive,
) -> Result<(), RelayError> {
    for index in 0..bank.len() {
        let key = protocol::relay_directive_key(index);
        let desired = match directive.relay(index) {
            Some(state) => {
                info!("received new target state {state} for {key}");
                state
            }
            None => {
                warn!(
                    "relay key {key} for relay idx={index} was expected but not in response. \
                     This is normal before activation."
                );
                RelayState::Off
            }
        };
        bank.set_state(index, desired)?;
    }
    Ok(())
}
