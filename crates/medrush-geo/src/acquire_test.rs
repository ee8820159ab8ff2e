use std::sync::Arc;

use super::*;
use crate::replay::{ReplaySensor, ScriptedReading};

fn sample(latitude: f64, longitude: f64, accuracy_meters: f64) -> ScriptedReading {
    ScriptedReading::Sample(PositionSample {
        latitude,
        longitude,
        accuracy_meters,
        timestamp_ms: 0,
    })
}

fn fail(error: SensorError) -> ScriptedReading {
    ScriptedReading::Error { error }
}

fn granted(readings: Vec<ScriptedReading>) -> ReplaySensor {
    ReplaySensor::new(PermissionState::Granted, readings)
}

fn fast_options() -> AcquireOptions {
    AcquireOptions::default().without_delays()
}

async fn located(sensor: &ReplaySensor, options: &AcquireOptions) -> LocationFix {
    acquire(sensor, options, &CancellationToken::new())
        .await
        .into_fix()
        .expect("acquisition should not be cancelled")
}

#[tokio::test]
async fn keeps_first_sample_with_minimum_accuracy() {
    let sensor = granted(vec![
        sample(1.0, 1.0, 500.0),
        sample(2.0, 2.0, 300.0),
        sample(3.0, 3.0, 300.0),
        sample(4.0, 4.0, 800.0),
    ]);
    let fix = located(&sensor, &fast_options().with_max_attempts(4)).await;

    assert!(!fix.is_fallback());
    assert!((fix.sample.accuracy_meters - 300.0).abs() < f64::EPSILON);
    assert!(
        (fix.sample.latitude - 2.0).abs() < f64::EPSILON,
        "equal accuracy must not replace the earlier best, got {:?}",
        fix.sample
    );
    assert_eq!(fix.attempts_made, 4);
    assert_eq!(fix.passes, 1);
}

#[tokio::test]
async fn stops_sampling_at_first_reading_under_threshold() {
    let sensor = granted(vec![
        sample(1.0, 1.0, 400.0),
        sample(2.0, 2.0, 90.0),
        sample(3.0, 3.0, 10.0),
    ]);
    let fix = located(&sensor, &fast_options()).await;

    assert_eq!(fix.attempts_made, 2);
    assert_eq!(sensor.requests().len(), 2);
    assert_eq!(sensor.remaining(), 1, "third reading must not be consumed");
    assert!((fix.sample.accuracy_meters - 90.0).abs() < f64::EPSILON);
    assert_eq!(fix.accuracy_tier(), AccuracyTier::Good);
    assert!(fix.user_message().is_none());
}

#[tokio::test]
async fn exactly_threshold_accuracy_does_not_exit_early() {
    let sensor = granted(vec![sample(1.0, 1.0, 100.0), sample(2.0, 2.0, 40.0)]);
    let fix = located(&sensor, &fast_options()).await;
    assert_eq!(fix.attempts_made, 2);
    assert!((fix.sample.accuracy_meters - 40.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn total_failure_returns_fallback_coordinate() {
    let sensor = granted(Vec::new());
    let options = fast_options().with_fallback(Coordinates::new(12.97, 77.59));
    let fix = located(&sensor, &options).await;

    assert_eq!(fix.fallback, Some(FallbackReason::Unavailable));
    assert!((fix.sample.latitude - 12.97).abs() < f64::EPSILON);
    assert!((fix.sample.longitude - 77.59).abs() < f64::EPSILON);
    assert!((fix.sample.accuracy_meters - FALLBACK_ACCURACY_METERS).abs() < f64::EPSILON);
    assert!(fix
        .user_message()
        .is_some_and(|m| m.contains("Could not get an accurate position")));
}

#[tokio::test]
async fn total_failure_runs_at_most_two_full_passes() {
    let sensor = granted(Vec::new());
    let fix = located(&sensor, &fast_options()).await;

    let requests = sensor.requests();
    let high = requests.iter().filter(|r| r.enable_high_accuracy).count();
    let low = requests.iter().filter(|r| !r.enable_high_accuracy).count();
    assert_eq!(high, 24, "two passes of 12 attempts");
    assert_eq!(low, 2, "one low-accuracy one-shot per pass");
    assert_eq!(fix.passes, 2);
    assert_eq!(fix.attempts_made, 24);
    assert!(fix.high_accuracy_mode_failed);
}

#[tokio::test]
async fn second_pass_result_is_used() {
    let sensor = granted(vec![
        fail(SensorError::Timeout),
        fail(SensorError::PositionUnavailable),
        fail(SensorError::Timeout),
        sample(5.0, 6.0, 60.0),
    ]);
    let fix = located(&sensor, &fast_options().with_max_attempts(3)).await;

    assert!(!fix.is_fallback());
    assert_eq!(fix.passes, 2);
    assert_eq!(fix.attempts_made, 4);
    assert!((fix.sample.latitude - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn denied_permission_aborts_before_any_attempt() {
    let sensor = ReplaySensor::new(PermissionState::Denied, vec![sample(1.0, 1.0, 5.0)]);
    let fix = located(&sensor, &fast_options()).await;

    assert_eq!(fix.fallback, Some(FallbackReason::PermissionDenied));
    assert!(sensor.requests().is_empty());
    assert_eq!(fix.attempts_made, 0);
    assert!(fix
        .user_message()
        .is_some_and(|m| m.contains("permission denied")));
}

#[tokio::test]
async fn permission_error_from_sensor_is_not_retried() {
    let sensor = granted(vec![fail(SensorError::PermissionDenied)]);
    let fix = located(&sensor, &fast_options()).await;

    assert_eq!(fix.fallback, Some(FallbackReason::PermissionDenied));
    assert_eq!(sensor.requests().len(), 1);
    assert_eq!(fix.passes, 1);
}

#[tokio::test]
async fn fifth_failure_triggers_one_low_accuracy_read() {
    let sensor = granted(vec![
        fail(SensorError::Timeout),
        fail(SensorError::Timeout),
        fail(SensorError::Timeout),
        fail(SensorError::Timeout),
        fail(SensorError::PositionUnavailable),
        sample(7.0, 7.0, 250.0),
        sample(8.0, 8.0, 80.0),
    ]);
    let fix = located(&sensor, &fast_options()).await;

    let requests = sensor.requests();
    assert_eq!(requests.len(), 7);
    assert!(requests[4].enable_high_accuracy);
    assert!(!requests[5].enable_high_accuracy, "one-shot is low accuracy");
    assert!(requests[6].enable_high_accuracy);
    assert!(fix.high_accuracy_mode_failed);
    assert_eq!(fix.attempts_made, 6);
    assert!((fix.sample.accuracy_meters - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn no_extra_read_when_high_accuracy_was_never_requested() {
    let mut readings: Vec<ScriptedReading> = (0..5).map(|_| fail(SensorError::Timeout)).collect();
    readings.push(sample(7.0, 7.0, 80.0));
    let sensor = granted(readings);
    let options = AcquireOptions {
        high_accuracy_first: false,
        ..fast_options()
    };
    let fix = located(&sensor, &options).await;

    let requests = sensor.requests();
    assert_eq!(requests.len(), 6);
    assert!(requests.iter().all(|r| !r.enable_high_accuracy));
    assert!(!fix.high_accuracy_mode_failed);
    assert_eq!(fix.attempts_made, 6);
    assert!((fix.sample.accuracy_meters - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn low_accuracy_read_can_end_sampling() {
    let mut readings: Vec<ScriptedReading> = (0..5).map(|_| fail(SensorError::Timeout)).collect();
    readings.push(sample(9.0, 9.0, 30.0));
    readings.push(sample(1.0, 1.0, 5.0));
    let sensor = granted(readings);
    let fix = located(&sensor, &fast_options()).await;

    assert_eq!(fix.attempts_made, 5);
    assert_eq!(sensor.remaining(), 1);
    assert!((fix.sample.latitude - 9.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn requests_are_fresh_with_shorter_early_timeouts() {
    let sensor = granted(Vec::new());
    let _ = located(&sensor, &fast_options().with_max_attempts(4)).await;

    let requests = sensor.requests();
    assert!(requests.iter().all(|r| r.maximum_age.is_zero()));
    assert_eq!(requests[0].timeout, Duration::from_secs(3));
    assert_eq!(requests[2].timeout, Duration::from_secs(3));
    assert_eq!(requests[3].timeout, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn sleeps_between_attempts_but_not_after_early_exit() {
    let sensor = granted(vec![
        sample(1.0, 1.0, 400.0),
        sample(1.0, 1.0, 300.0),
        sample(1.0, 1.0, 50.0),
    ]);
    let started = tokio::time::Instant::now();
    let _ = located(&sensor, &AcquireOptions::default()).await;
    assert_eq!(started.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn outer_retry_waits_before_second_pass() {
    let sensor = granted(Vec::new());
    let options = AcquireOptions::default().with_max_attempts(2);
    let started = tokio::time::Instant::now();
    let fix = located(&sensor, &options).await;

    // Two passes × one 300 ms gap, plus the 500 ms outer retry delay.
    assert_eq!(started.elapsed(), Duration::from_millis(1100));
    assert_eq!(fix.passes, 2);
}

#[tokio::test]
async fn cancelled_token_skips_sensor() {
    let sensor = granted(vec![sample(1.0, 1.0, 5.0)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = acquire(&sensor, &fast_options(), &cancel).await;
    assert!(matches!(outcome, AcquireOutcome::Cancelled));
    assert!(sensor.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_further_attempts() {
    let sensor = Arc::new(granted(Vec::new()));
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        canceller.cancel();
    });

    let outcome = acquire(sensor.as_ref(), &AcquireOptions::default(), &cancel).await;
    assert!(matches!(outcome, AcquireOutcome::Cancelled));
    let made = sensor.requests().len();
    assert!(made < 24, "acquisition kept running after cancel: {made} requests");
}

#[test]
fn accuracy_tiers_match_thresholds() {
    assert_eq!(AccuracyTier::classify(15.0), AccuracyTier::Good);
    assert_eq!(AccuracyTier::classify(100.0), AccuracyTier::Good);
    assert_eq!(AccuracyTier::classify(100.5), AccuracyTier::Limited);
    assert_eq!(AccuracyTier::classify(1000.0), AccuracyTier::Limited);
    assert_eq!(AccuracyTier::classify(1000.1), AccuracyTier::VeryLimited);
    assert!(AccuracyTier::Good.warning().is_none());
    assert!(AccuracyTier::VeryLimited
        .warning()
        .is_some_and(|w| w.contains("very limited")));
}

#[test]
fn consider_ignores_ties_and_nan() {
    let mut state = LocationAcquisitionState::default();
    let first = PositionSample {
        latitude: 1.0,
        longitude: 1.0,
        accuracy_meters: 50.0,
        timestamp_ms: 0,
    };
    let tie = PositionSample {
        latitude: 2.0,
        ..first
    };
    let nan = PositionSample {
        accuracy_meters: f64::NAN,
        ..first
    };
    assert!(state.consider(first));
    assert!(!state.consider(tie));
    assert!(!state.consider(nan));
    assert_eq!(state.best_sample, Some(first));
}
