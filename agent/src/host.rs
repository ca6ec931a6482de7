use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use bricks_common::{ActuatorBank, AgentSettings, BricksConfig, DeviceIdentity, SensorReader};
use bricks_hardware::{PinMap, SysfsOneWire};
use tracing::info;

use crate::{
    agent::Agent,
    logging,
    sync::{SyncClient, SyncSettings},
    transport::HttpTransport,
};

const DEFAULT_CONFIG_PATH: &str = "./bricks.yaml";
const DEFAULT_LOG_FILE: &str = "./bricks.log";

pub async fn run() -> anyhow::Result<()> {
    let log_file = match std::env::var("BRICKS_LOG_FILE") {
        Ok(path) if path.is_empty() => None,
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    };
    let _log_guard = logging::init(log_file.as_deref());
    info!("BierBot Bricks RaspberryPi client started.");

    let config_path = std::env::var("BRICKS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = BricksConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!("read config");

    if let Ok(endpoint) = std::env::var("BRICKS_ENDPOINT") {
        config.agent.endpoint = endpoint;
    }
    config.validate()?;

    info!(
        "apikey={}, device_id={}, platform={}",
        config.redacted_apikey(),
        config.device_id,
        config.meta.platform
    );

    let transport = HttpTransport::new(
        config.agent.endpoint.clone(),
        Duration::from_millis(config.agent.request_timeout_ms),
    )
    .context("failed to create http client")?;
    info!("controller endpoint {}", transport.endpoint());

    let client = SyncClient::new(
        transport,
        DeviceIdentity::from_config(&config),
        config.sensors(),
        SyncSettings::from(&config.agent),
    );

    let gpio = PinMap::new(gpio_backend()?, config.agent.pin_numbering);
    let bank = ActuatorBank::from_config(gpio, &config.relays);
    let reader = SensorReader::new(
        SysfsOneWire::new(&config.agent.w1_devices_dir),
        thermocouple_backend(&config.agent),
    );

    let mut agent = Agent::start(bank, reader, client).context("failed to initialize relays")?;
    match agent.run().await {}
}

#[cfg(feature = "rpi")]
fn gpio_backend() -> anyhow::Result<bricks_hardware::rpi::RpiGpio> {
    bricks_hardware::rpi::RpiGpio::new().context("failed to open gpio peripheral")
}

#[cfg(not(feature = "rpi"))]
fn gpio_backend() -> anyhow::Result<bricks_hardware::SimulatedGpio> {
    tracing::warn!("built without the `rpi` feature; relays are simulated");
    Ok(bricks_hardware::SimulatedGpio::default())
}

#[cfg(feature = "rpi")]
fn thermocouple_backend(settings: &AgentSettings) -> bricks_hardware::mcp9600::Mcp9600Bus {
    bricks_hardware::mcp9600::Mcp9600Bus::new(settings.i2c_bus)
}

#[cfg(not(feature = "rpi"))]
fn thermocouple_backend(_settings: &AgentSettings) -> bricks_hardware::SimulatedThermocouple {
    tracing::warn!("built without the `rpi` feature; thermocouples are simulated");
    bricks_hardware::SimulatedThermocouple::default()
}
