//! Thermistor telemetry daemon
//!
//! Wires the sampling engine from `thermolog-core` to the delivery client,
//! responder and ADC transports from `thermolog-connectors`:
//!
//! - [`config`]: layered configuration (defaults, TOML file, environment)
//! - [`pipeline`]: the sampling, reporting and responder tasks
//!
//! The `thermolog` binary adds the command line and logging setup on top.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod pipeline;

pub use config::{Config, ConfigError};
pub use pipeline::{run, PipelineError, Reporter};
