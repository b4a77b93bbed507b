//! Periodic tasks driving the daemon
//!
//! ## Overview
//!
//! Three tokio tasks share one runtime:
//!
//! ```text
//!  sampling (33 ms)          reporting                       responder
//!  ┌──────────────┐          ┌──────────────────────────┐    ┌──────────┐
//!  │ ADC transfer │          │ aggregate (2 s)          │    │ GET /    │
//!  │ ingest ──────┼──▶ ring ─┼─▶ average ─▶ °C ─▶ add   │    │  reads   │
//!  └──────────────┘  buffer  │ deliver (20 s)           │    │  file    │
//!                            │   send ─await─▶ flush ───┼──▶ └──────────┘
//!                            └──────────────────────────┘
//! ```
//!
//! The sampler is the only state shared across tasks; it sits behind a
//! `std::sync::Mutex` held just long enough to ingest one count or read the
//! average. The [`Reporter`] owns the converter, the pending log and the
//! delivery client, so aggregation, delivery and flush never interleave.
//!
//! All loops stop when the shutdown signal flips. Pending points are not
//! drained on the way out.

use std::net::TcpListener;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thermolog_connectors::responder::{self, ResponderError};
use thermolog_connectors::{Collector, DeliveryClient};
use thermolog_core::adc::read_command;
use thermolog_core::{
    AdcTransport, ConversionError, DataPoint, DataPointLog, FlushOutcome, ResistanceSampler,
    StorageError, TemperatureConverter, TimeSource,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::{Config, ScheduleConfig};

/// Sampler shared between the sampling and reporting tasks
pub type SharedSampler = Arc<Mutex<ResistanceSampler>>;

/// Receiving side of the shutdown signal
pub type Shutdown = watch::Receiver<bool>;

/// Pipeline task failures
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Responder could not start or crashed
    #[error(transparent)]
    Responder(#[from] ResponderError),

    /// A task panicked
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Wrap a sampler for sharing
pub fn share(sampler: ResistanceSampler) -> SharedSampler {
    Arc::new(Mutex::new(sampler))
}

fn lock(sampler: &SharedSampler) -> MutexGuard<'_, ResistanceSampler> {
    // Ring buffer stays consistent across a panicked ingest
    sampler.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read one sample per tick until shutdown
///
/// Transfer errors skip the tick. The transport is handed back on exit.
pub async fn sample_loop<A: AdcTransport>(
    mut adc: A,
    channel: u8,
    sampler: SharedSampler,
    period: Duration,
    mut shutdown: Shutdown,
) -> A {
    let command = read_command(channel);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match adc.transfer(&command) {
                    Ok(reply) => {
                        let outcome = lock(&sampler).ingest(&reply);
                        log::trace!("sample: {:?}", outcome);
                    }
                    Err(e) => log::warn!("ADC read failed: {}", e),
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    adc
}

/// Converts, queues, delivers and persists readings
pub struct Reporter<C, T> {
    sampler: SharedSampler,
    converter: TemperatureConverter,
    log: DataPointLog,
    client: DeliveryClient<C>,
    clock: T,
}

impl<C: Collector, T: TimeSource> Reporter<C, T> {
    /// Assemble a reporter over an existing shared sampler
    pub fn new(
        sampler: SharedSampler,
        converter: TemperatureConverter,
        log: DataPointLog,
        client: DeliveryClient<C>,
        clock: T,
    ) -> Self {
        Self {
            sampler,
            converter,
            log,
            client,
            clock,
        }
    }

    /// Turn the current buffer average into a pending data point
    ///
    /// Returns `None` when there is no usable reading; nothing is queued.
    pub fn aggregate(&mut self) -> Option<DataPoint> {
        let average = lock(&self.sampler).average();

        match self.converter.convert(average) {
            Ok(conversion) => {
                let point = DataPoint::new(self.clock.now_seconds(), conversion.temperature);
                self.log.add(point);
                Some(point)
            }
            Err(ConversionError::NoReading { average }) => {
                log::debug!("no reading (average {:.2})", average);
                None
            }
            Err(e) => {
                log::warn!("conversion failed: {}", e);
                None
            }
        }
    }

    /// Send pending points, then flush them according to the outcome
    pub async fn deliver(&mut self) -> Result<FlushOutcome, StorageError> {
        let state = self.client.send(self.log.pending()).await;
        let outcome = self.log.flush_to_file(state)?;
        if let FlushOutcome::Written { .. } = outcome {
            self.client.settle();
        }
        Ok(outcome)
    }

    /// Pending data log
    pub fn log(&self) -> &DataPointLog {
        &self.log
    }

    /// Delivery client
    pub fn client(&self) -> &DeliveryClient<C> {
        &self.client
    }

    /// Shared sampler handle
    pub fn sampler(&self) -> SharedSampler {
        Arc::clone(&self.sampler)
    }
}

/// Run aggregation and delivery ticks until shutdown
///
/// Storage errors are logged and retried on the next delivery tick.
pub async fn report_loop<C: Collector, T: TimeSource>(
    mut reporter: Reporter<C, T>,
    schedule: ScheduleConfig,
    mut shutdown: Shutdown,
) -> Reporter<C, T> {
    let start = Instant::now();
    let mut aggregate = interval_at(start + schedule.aggregate_interval(), schedule.aggregate_interval());
    let mut delivery = interval_at(start + schedule.delivery_interval(), schedule.delivery_interval());
    aggregate.set_missed_tick_behavior(MissedTickBehavior::Delay);
    delivery.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = aggregate.tick() => {
                reporter.aggregate();
            }
            _ = delivery.tick() => {
                match reporter.deliver().await {
                    Ok(_) => {}
                    Err(e @ (StorageError::Corrupt { .. } | StorageError::Read { .. })) => {
                        log::error!("{}", e);
                    }
                    Err(e) => log::warn!("flush failed, points kept: {}", e),
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    let held = reporter.log().pending().len();
    if held > 0 {
        log::warn!("stopping with {} unsaved points", held);
    }
    reporter
}

/// Run every task until shutdown
///
/// `responder` is the listener for the read-only file server; `None` skips
/// it. Returns the reporter so callers can inspect what was left pending.
pub async fn run<A, C, T>(
    config: &Config,
    adc: A,
    reporter: Reporter<C, T>,
    responder: Option<TcpListener>,
    shutdown: Shutdown,
) -> Result<Reporter<C, T>, PipelineError>
where
    A: AdcTransport + 'static,
    C: Collector + 'static,
    T: TimeSource + 'static,
{
    let sampling = tokio::spawn(sample_loop(
        adc,
        config.adc.channel,
        reporter.sampler(),
        config.schedule.sample_interval(),
        shutdown.clone(),
    ));

    let server = responder.map(|listener| {
        let mut stop = shutdown.clone();
        tokio::spawn(responder::serve_listener(
            listener,
            config.storage.data_file.clone(),
            async move {
                let _ = stop.changed().await;
            },
        ))
    });

    let reporting = tokio::spawn(report_loop(reporter, config.schedule, shutdown));

    // A dead task must not leave its siblings running detached
    let abort_server = |server: &Option<JoinHandle<Result<(), ResponderError>>>| {
        if let Some(server) = server {
            server.abort();
        }
    };

    let reporter = match reporting.await {
        Ok(reporter) => reporter,
        Err(e) => {
            log::error!("reporting task failed: {}", e);
            sampling.abort();
            abort_server(&server);
            return Err(e.into());
        }
    };
    if let Err(e) = sampling.await {
        log::error!("sampling task failed: {}", e);
        abort_server(&server);
        return Err(e.into());
    }
    if let Some(server) = server {
        server.await??;
    }

    log::info!("pipeline stopped");
    Ok(reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tempfile::TempDir;
    use thermolog_connectors::DeliveryError;
    use thermolog_core::adc::encode_reply;
    use thermolog_core::time::MockClock;
    use thermolog_core::{AdcError, AdcFrame, SamplerConfig, ThermistorModel, TransmissionState};

    #[derive(Clone, Default)]
    struct Switch {
        down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Collector for Switch {
        async fn deliver(&self, points: &[DataPoint]) -> Result<usize, DeliveryError> {
            if self.down.load(Ordering::SeqCst) {
                Err(DeliveryError::Transport("connection refused".into()))
            } else {
                Ok(points.len())
            }
        }
    }

    fn reporter(dir: &TempDir, collector: Switch) -> Reporter<Switch, MockClock> {
        Reporter::new(
            share(ResistanceSampler::new(SamplerConfig::default())),
            TemperatureConverter::new(ThermistorModel::default()),
            DataPointLog::new(dir.path().join("readings.data")),
            DeliveryClient::new(collector),
            MockClock::at_seconds(1_700_000_000),
        )
    }

    struct PanickingCollector;

    #[async_trait]
    impl Collector for PanickingCollector {
        async fn deliver(&self, _points: &[DataPoint]) -> Result<usize, DeliveryError> {
            panic!("collector bug");
        }
    }

    #[derive(Clone, Default)]
    struct CountingAdc {
        reads: Arc<AtomicU64>,
    }

    impl AdcTransport for CountingAdc {
        fn transfer(&mut self, _command: &AdcFrame) -> Result<AdcFrame, AdcError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(encode_reply(512))
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_reporting_task_stops_sampling() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_file = dir.path().join("readings.data");
        config.schedule.sample_interval_ms = 10;
        config.schedule.aggregate_interval_ms = 20;
        config.schedule.delivery_interval_ms = 50;

        let adc = CountingAdc::default();
        let reporter = Reporter::new(
            share(ResistanceSampler::new(config.sampler.clone())),
            TemperatureConverter::new(config.thermistor.clone()),
            DataPointLog::new(config.storage.data_file.clone()),
            DeliveryClient::new(PanickingCollector),
            MockClock::at_seconds(1_700_000_000),
        );

        // Sender stays alive: only the task failure can end the run
        let (_stop, shutdown) = watch::channel(false);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run(&config, adc.clone(), reporter, None, shutdown),
        )
        .await
        .expect("run should return once the reporting task dies");
        assert!(matches!(result, Err(PipelineError::Task(_))));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = adc.reads.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(adc.reads.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn aggregate_without_samples_queues_nothing() {
        let dir = TempDir::new().unwrap();
        let mut reporter = reporter(&dir, Switch::default());
        assert!(reporter.aggregate().is_none());
        assert!(reporter.log().pending().is_empty());
    }

    #[test]
    fn aggregate_stamps_and_queues() {
        let dir = TempDir::new().unwrap();
        let mut reporter = reporter(&dir, Switch::default());
        lock(&reporter.sampler).ingest(&encode_reply(512));

        let point = reporter.aggregate().unwrap();
        assert_eq!(point.timestamp, 1_700_000_000);
        // 9879 Ω, 25.27 °C plus the 0.5 °C calibration offset
        assert!((point.temperature - 25.77).abs() < 0.01, "{}", point.temperature);
        assert_eq!(reporter.log().pending(), &[point]);
    }

    #[tokio::test]
    async fn delivery_outage_holds_points() {
        let dir = TempDir::new().unwrap();
        let collector = Switch::default();
        let mut reporter = reporter(&dir, collector.clone());
        lock(&reporter.sampler).ingest(&encode_reply(500));

        collector.down.store(true, Ordering::SeqCst);
        reporter.aggregate();
        assert_eq!(reporter.deliver().await.unwrap(), FlushOutcome::Suppressed);
        assert_eq!(reporter.client().state(), TransmissionState::Failed);

        collector.down.store(false, Ordering::SeqCst);
        reporter.aggregate();
        assert_eq!(
            reporter.deliver().await.unwrap(),
            FlushOutcome::Written { appended: 2, total: 2 }
        );
        assert_eq!(reporter.client().state(), TransmissionState::Idle);
        assert!(reporter.log().pending().is_empty());
    }
}
