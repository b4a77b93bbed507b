//! Daemon configuration using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. built-in defaults
//! 2. a TOML file (`thermolog.toml` unless `--config` says otherwise)
//! 3. environment variables prefixed `THERMOLOG_`, with `__` separating the
//!    section from the key (`THERMOLOG_DELIVERY__ENDPOINT_URL=...`)
//!
//! ```toml
//! [adc]
//! device = "/dev/spidev0.0"
//! channel = 0
//!
//! [delivery]
//! endpoint_url = "http://192.168.1.141/dev/test.php"
//!
//! [schedule]
//! aggregate_interval_ms = 2000
//! ```
//!
//! The loaded value is immutable; every task gets its own copy of the
//! section it needs.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thermolog_core::constants::time::{
    DEFAULT_AGGREGATE_INTERVAL_MS, DEFAULT_DELIVERY_INTERVAL_MS, DEFAULT_SAMPLE_INTERVAL_MS,
};
use thermolog_core::constants::{ADC_MAX_CHANNEL, MIN_TICK_MS};
use thermolog_core::{SamplerConfig, ThermistorModel};
use thiserror::Error;

/// Default configuration file
pub const DEFAULT_CONFIG_FILE: &str = "thermolog.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "THERMOLOG_";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the schema
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Values loaded but violate a constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ADC transport
    pub adc: AdcConfig,
    /// Spike filter and ring buffer
    pub sampler: SamplerConfig,
    /// Thermistor constants
    pub thermistor: ThermistorModel,
    /// Durable log location
    pub storage: StorageConfig,
    /// Remote collector
    pub delivery: DeliveryConfig,
    /// Task periods
    pub schedule: ScheduleConfig,
    /// Read-only responder
    pub server: ServerConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// SPI converter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    /// Linux SPI device node
    pub device: String,
    /// Single-ended input channel (0-7)
    pub channel: u8,
    /// SPI clock
    pub bus_speed_hz: u32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            device: "/dev/spidev0.0".to_string(),
            channel: 0,
            bus_speed_hz: 1_000_000,
        }
    }
}

/// Durable log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON array file holding every persisted point
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/readings.data"),
        }
    }
}

/// Remote collector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Collector URL
    pub endpoint_url: String,
    /// Request timeout
    pub timeout_ms: u64,
    /// Form field carrying the JSON payload
    pub form_field: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://192.168.1.141/dev/test.php".to_string(),
            timeout_ms: 5000,
            form_field: "payload".to_string(),
        }
    }
}

/// Task periods in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Between ADC reads
    pub sample_interval_ms: u64,
    /// Between temperature conversions
    pub aggregate_interval_ms: u64,
    /// Between delivery attempts
    pub delivery_interval_ms: u64,
}

impl ScheduleConfig {
    /// Sampling period
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Aggregation period
    pub fn aggregate_interval(&self) -> Duration {
        Duration::from_millis(self.aggregate_interval_ms)
    }

    /// Delivery period
    pub fn delivery_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_interval_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            aggregate_interval_ms: DEFAULT_AGGREGATE_INTERVAL_MS,
            delivery_interval_ms: DEFAULT_DELIVERY_INTERVAL_MS,
        }
    }
}

/// Responder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from defaults, `path` and the environment, then validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path.as_ref())
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Provider stack without extraction
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.adc.channel > ADC_MAX_CHANNEL {
            return invalid(format!(
                "adc.channel {} out of range 0-{}",
                self.adc.channel, ADC_MAX_CHANNEL
            ));
        }
        if self.adc.bus_speed_hz == 0 {
            return invalid("adc.bus_speed_hz must be non-zero".into());
        }

        if self.sampler.resistances_to_keep == 0 {
            return invalid("sampler.resistances_to_keep must be at least 1".into());
        }
        let pct = self.sampler.ignore_data_beyond_pct;
        if !pct.is_finite() || pct <= 0.0 {
            return invalid(format!(
                "sampler.ignore_data_beyond_pct must be a positive number, got {}",
                pct
            ));
        }
        if !self.sampler.average_offset.is_finite() {
            return invalid("sampler.average_offset must be finite".into());
        }

        let model = &self.thermistor;
        for (name, value) in [
            ("nominal_resistance", model.nominal_resistance),
            ("bcoefficient", model.bcoefficient),
            ("series_resistor", model.series_resistor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("thermistor.{} must be positive, got {}", name, value));
            }
        }
        if !model.nominal_temp.is_finite() || !model.calibration_offset.is_finite() {
            return invalid("thermistor temperatures must be finite".into());
        }

        if self.storage.data_file.as_os_str().is_empty() {
            return invalid("storage.data_file must not be empty".into());
        }

        let url = &self.delivery.endpoint_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return invalid(format!(
                "delivery.endpoint_url must start with http:// or https://, got '{}'",
                url
            ));
        }
        if self.delivery.timeout_ms == 0 {
            return invalid("delivery.timeout_ms must be non-zero".into());
        }
        if self.delivery.form_field.is_empty() {
            return invalid("delivery.form_field must not be empty".into());
        }

        let schedule = &self.schedule;
        for (name, ms) in [
            ("sample_interval_ms", schedule.sample_interval_ms),
            ("aggregate_interval_ms", schedule.aggregate_interval_ms),
            ("delivery_interval_ms", schedule.delivery_interval_ms),
        ] {
            if ms < MIN_TICK_MS {
                return invalid(format!(
                    "schedule.{} must be at least {} ms, got {}",
                    name, MIN_TICK_MS, ms
                ));
            }
        }
        if schedule.sample_interval_ms >= schedule.aggregate_interval_ms {
            return invalid("schedule.sample_interval_ms must be shorter than aggregate_interval_ms".into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return invalid(format!(
                "logging.level '{}' must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use thermolog_core::SpikePolicy;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampler.resistances_to_keep, 1000);
        assert_eq!(config.schedule.aggregate_interval(), Duration::from_secs(2));
        assert_eq!(config.server.bind.port(), 8000);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load("absent.toml").map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "thermolog.toml",
                r#"
                [sampler]
                resistances_to_keep = 50
                spike_policy = "zero-and-deviation"

                [delivery]
                endpoint_url = "http://collector.local/ingest"

                [schedule]
                delivery_interval_ms = 60000
                "#,
            )?;
            jail.set_env("THERMOLOG_DELIVERY__TIMEOUT_MS", "750");
            jail.set_env("THERMOLOG_SCHEDULE__DELIVERY_INTERVAL_MS", "30000");

            let config = Config::load("thermolog.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.sampler.resistances_to_keep, 50);
            assert_eq!(config.sampler.spike_policy, SpikePolicy::ZeroAndDeviation);
            // Unset keys in a present section keep their defaults
            assert_eq!(config.sampler.ignore_data_beyond_pct, 0.02);
            assert_eq!(config.delivery.endpoint_url, "http://collector.local/ingest");
            assert_eq!(config.delivery.timeout_ms, 750);
            assert_eq!(config.schedule.delivery_interval_ms, 30000);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_reported() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[adc]\nchannel = 9\n")?;
            let err = Config::load("bad.toml").unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("adc.channel")));
            Ok(())
        });
    }

    #[test]
    fn wrong_type_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[schedule]\nsample_interval_ms = \"fast\"\n")?;
            assert!(matches!(
                Config::load("bad.toml"),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn validation_rules() {
        let check = |f: fn(&mut Config)| {
            let mut config = Config::default();
            f(&mut config);
            config.validate()
        };

        assert!(check(|c| c.sampler.resistances_to_keep = 0).is_err());
        assert!(check(|c| c.sampler.ignore_data_beyond_pct = f64::NAN).is_err());
        assert!(check(|c| c.sampler.ignore_data_beyond_pct = 0.0).is_err());
        assert!(check(|c| c.thermistor.series_resistor = -1.0).is_err());
        assert!(check(|c| c.delivery.endpoint_url = "ftp://x".into()).is_err());
        assert!(check(|c| c.delivery.timeout_ms = 0).is_err());
        assert!(check(|c| c.schedule.sample_interval_ms = 5).is_err());
        assert!(check(|c| c.schedule.sample_interval_ms = 2000).is_err());
        assert!(check(|c| c.logging.level = "loud".into()).is_err());
        assert!(check(|c| c.schedule.delivery_interval_ms = 10).is_ok());
    }
}
