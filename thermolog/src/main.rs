//! thermolog daemon
//!
//! # Usage
//!
//! ```bash
//! # Run with ./thermolog.toml and the real ADC
//! thermolog
//!
//! # Explicit config file, verbose logging
//! thermolog --config /etc/thermolog.toml --verbose
//!
//! # Off-target run with the simulated converter
//! thermolog --simulate
//!
//! # Load and validate configuration, print it and exit
//! thermolog --check
//! ```

use std::net::TcpListener;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use thermolog::config::{Config, DEFAULT_CONFIG_FILE};
use thermolog::pipeline::{self, Reporter};
use thermolog_connectors::http::{HttpCollector, HttpConfig};
use thermolog_connectors::DeliveryClient;
use thermolog_core::adc::SimulatedAdc;
use thermolog_core::{
    AdcTransport, DataPointLog, ResistanceSampler, SystemClock, TemperatureConverter,
};
use tokio::sync::watch;

/// Sample a thermistor, persist readings and forward them to a collector
#[derive(Parser, Debug)]
#[command(name = "thermolog")]
#[command(version)]
#[command(about = "Thermistor telemetry daemon", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Validate configuration, print it and exit
    #[arg(long)]
    check: bool,

    /// Use the simulated ADC instead of SPI
    #[arg(long)]
    simulate: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    init_logging(&config.logging.level, args.verbose);

    if args.check {
        println!("{:#?}", config);
        return Ok(());
    }

    let adc = open_adc(&config, args.simulate)?;

    let collector = HttpCollector::new(
        HttpConfig::new(config.delivery.endpoint_url.clone())
            .timeout_ms(config.delivery.timeout_ms)
            .form_field(config.delivery.form_field.clone()),
    )
    .context("creating delivery client")?;

    let reporter = Reporter::new(
        pipeline::share(ResistanceSampler::new(config.sampler)),
        TemperatureConverter::new(config.thermistor),
        DataPointLog::new(config.storage.data_file.clone()),
        DeliveryClient::new(collector),
        SystemClock,
    );

    let listener = TcpListener::bind(config.server.bind)
        .with_context(|| format!("binding responder to {}", config.server.bind))?;

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("interrupt received, stopping"),
            Err(e) => log::error!("cannot listen for interrupt: {}", e),
        }
        let _ = stop.send(true);
    });

    log::info!(
        "thermolog {} sampling channel {} every {} ms",
        env!("CARGO_PKG_VERSION"),
        config.adc.channel,
        config.schedule.sample_interval_ms
    );

    pipeline::run(&config, adc, reporter, Some(listener), shutdown)
        .await
        .context("pipeline failed")?;

    Ok(())
}

fn simulated_adc() -> Box<dyn AdcTransport> {
    log::info!("using simulated ADC");
    // Mid-scale, about 25 °C with the stock 10k divider
    Box::new(SimulatedAdc::new(512))
}

#[cfg(feature = "spi")]
fn open_adc(config: &Config, simulate: bool) -> Result<Box<dyn AdcTransport>> {
    if simulate {
        return Ok(simulated_adc());
    }
    let adc = thermolog_connectors::spi::SpiAdc::open(&config.adc.device, config.adc.bus_speed_hz)
        .with_context(|| format!("opening {}", config.adc.device))?;
    Ok(Box::new(adc))
}

#[cfg(not(feature = "spi"))]
fn open_adc(_config: &Config, _simulate: bool) -> Result<Box<dyn AdcTransport>> {
    Ok(simulated_adc())
}

fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("thermolog", filter)
        .filter_module("thermolog_core", filter)
        .filter_module("thermolog_connectors", filter)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}
