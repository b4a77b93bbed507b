//! Sampling → conversion → durable log, without any scheduler

mod common;

use std::fs;

use tempfile::TempDir;
use thermolog_core::time::MockClock;
use thermolog_core::{
    DataPoint, DataPointLog, FlushOutcome, SpikePolicy, StorageError, TemperatureConverter,
    ThermistorModel, TimeSource, TransmissionState,
};

#[test]
fn spikes_and_zeros_are_filtered_before_averaging() {
    let mut sampler = common::sampler(3, 0.5);

    for reply in common::replies(&[500, 510, 495, 0, 1000]) {
        sampler.ingest(&reply);
    }

    assert_eq!(sampler.buffer().iter().collect::<Vec<_>>(), vec![500, 510, 495]);
    assert!((sampler.average() - 501.666_666).abs() < 1e-3);
}

#[test]
fn and_policy_keeps_the_deviating_sample() {
    let mut sampler = common::sampler_with_policy(3, 0.5, SpikePolicy::ZeroAndDeviation);

    for reply in common::replies(&[500, 510, 495, 0, 1000]) {
        sampler.ingest(&reply);
    }

    // Zeros are always dropped; the 1000 deviates but is not zero and stays
    assert_eq!(sampler.buffer().iter().collect::<Vec<_>>(), vec![510, 495, 1000]);
}

#[test]
fn window_slides_over_newest_samples() {
    let mut sampler = common::sampler(3, 0.5);
    for reply in common::replies(&[100, 120, 110, 130, 125]) {
        sampler.ingest(&reply);
    }
    assert_eq!(sampler.buffer().iter().collect::<Vec<_>>(), vec![110, 130, 125]);
    assert_eq!(sampler.buffer().cursor(), 2);
}

#[test]
fn converted_readings_reach_the_file_in_order() {
    let dir = TempDir::new().unwrap();
    let clock = MockClock::at_seconds(1_700_000_000);
    let converter = TemperatureConverter::new(ThermistorModel::default());
    let mut sampler = common::sampler(16, 0.05);
    let mut log = DataPointLog::new(dir.path().join("data").join("readings.data"));

    for counts in [[510, 512, 511], [520, 519, 521]] {
        for reply in common::replies(&counts) {
            sampler.ingest(&reply);
        }
        let conversion = converter.convert(sampler.average()).unwrap();
        log.add(DataPoint::new(clock.now_seconds(), conversion.temperature));
        clock.advance(2_000);
    }

    let outcome = log.flush_to_file(TransmissionState::Succeeded).unwrap();
    assert_eq!(outcome, FlushOutcome::Written { appended: 2, total: 2 });

    let stored = log.read_persisted().unwrap();
    assert_eq!(stored[0].timestamp, 1_700_000_000);
    assert_eq!(stored[1].timestamp, 1_700_000_002);
    // Higher count means lower thermistor resistance, so warmer
    assert!(stored[1].temperature > stored[0].temperature);
}

#[test]
fn empty_buffer_produces_no_reading() {
    let converter = TemperatureConverter::new(ThermistorModel::default());
    let sampler = common::sampler(4, 0.1);

    assert_eq!(sampler.average(), 0.0);
    assert!(converter.convert(sampler.average()).is_err());
}

#[test]
fn retried_flush_never_duplicates() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    // A regular file where the data directory should be makes writes fail
    fs::write(&blocker, b"").unwrap();

    let mut log = DataPointLog::new(blocker.join("readings.data"));
    log.add(DataPoint::new(1, 20.0));
    log.add(DataPoint::new(2, 20.1));

    assert!(log.flush_to_file(TransmissionState::Idle).is_err());
    assert!(log.flush_to_file(TransmissionState::Idle).is_err());
    assert_eq!(log.pending().len(), 2);

    fs::remove_file(&blocker).unwrap();
    log.add(DataPoint::new(3, 20.2));
    log.flush_to_file(TransmissionState::Idle).unwrap();
    assert_eq!(
        log.flush_to_file(TransmissionState::Idle).unwrap(),
        FlushOutcome::NothingPending
    );

    assert_eq!(
        log.read_persisted().unwrap(),
        vec![
            DataPoint::new(1, 20.0),
            DataPoint::new(2, 20.1),
            DataPoint::new(3, 20.2),
        ]
    );
}

#[test]
fn write_failure_over_existing_history_retries_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.data");
    fs::write(&path, "[[1,18.5]]").unwrap();
    let blocker = dir.path().join("readings.data.tmp");
    fs::create_dir(&blocker).unwrap();

    let mut log = DataPointLog::new(&path);
    log.add(DataPoint::new(2, 18.6));
    assert!(matches!(
        log.flush_to_file(TransmissionState::Idle),
        Err(StorageError::Write { .. })
    ));
    assert_eq!(fs::read(&path).unwrap(), b"[[1,18.5]]");
    assert_eq!(log.pending(), &[DataPoint::new(2, 18.6)]);

    fs::remove_dir(&blocker).unwrap();
    log.flush_to_file(TransmissionState::Idle).unwrap();
    log.flush_to_file(TransmissionState::Idle).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[[1,18.5],[2,18.6]]");
}

#[test]
fn failed_delivery_then_recovery_keeps_every_point() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readings.data");
    fs::write(&path, "[[1,18.5]]").unwrap();
    let mut log = DataPointLog::new(&path);

    log.add(DataPoint::new(2, 18.6));
    let failed = TransmissionState::Idle.begin().finish(false);
    assert_eq!(log.flush_to_file(failed).unwrap(), FlushOutcome::Suppressed);
    assert_eq!(fs::read(&path).unwrap(), b"[[1,18.5]]");

    log.add(DataPoint::new(3, 18.7));
    let recovered = failed.begin().finish(true);
    log.flush_to_file(recovered).unwrap();

    assert_eq!(
        log.read_persisted().unwrap(),
        vec![
            DataPoint::new(1, 18.5),
            DataPoint::new(2, 18.6),
            DataPoint::new(3, 18.7),
        ]
    );
}
