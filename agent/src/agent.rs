use std::convert::Infallible;

use bricks_common::{
    ActuatorBank, GpioPort, OneWirePort, RelayError, SensorReader, ThermocouplePort,
};
use tracing::{debug, info};

use crate::{
    sync::{CycleOutcome, SyncClient},
    transport::Transport,
};

/// Owns the relays, the sensors, and the controller client. Relays are
/// initialized exactly once, in [`Agent::start`].
pub struct Agent<G, W, T, X> {
    bank: ActuatorBank<G>,
    reader: SensorReader<W, T>,
    client: SyncClient<X>,
    cycles: u64,
}

impl<G, W, T, X> Agent<G, W, T, X>
where
    G: GpioPort,
    W: OneWirePort,
    T: ThermocouplePort,
    X: Transport,
{
    pub fn start(
        mut bank: ActuatorBank<G>,
        reader: SensorReader<W, T>,
        client: SyncClient<X>,
    ) -> Result<Self, RelayError> {
        bank.initialize()?;
        info!("{} relay(s) initialized", bank.len());
        Ok(Self {
            bank,
            reader,
            client,
            cycles: 0,
        })
    }

    pub async fn step(&mut self) -> CycleOutcome {
        self.cycles = self.cycles.saturating_add(1);
        debug!("sync cycle {}", self.cycles);
        self.client.cycle(&mut self.bank, &mut self.reader).await
    }

    /// Cycles until the process is stopped from outside.
    pub async fn run(&mut self) -> Infallible {
        loop {
            let outcome = self.step().await;
            tokio::time::sleep(outcome.sleep()).await;
        }
    }

    pub fn bank(&self) -> &ActuatorBank<G> {
        &self.bank
    }

    pub fn client(&self) -> &SyncClient<X> {
        &self.client
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
