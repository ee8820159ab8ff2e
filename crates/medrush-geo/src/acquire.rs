//! Best-effort accurate geolocation acquisition.
//!
//! [`acquire`] asks the sensor for fresh readings up to
//! [`AcquireOptions::max_attempts`] times, keeps the reading with the lowest
//! reported error, and stops early once one is within
//! [`AcquireOptions::good_enough_meters`]. Per-reading failures are logged and
//! swallowed. When a whole pass yields nothing the pass is repeated once; if
//! that also yields nothing the fixed fallback coordinate is returned.
//!
//! Schedule with the defaults:
//!
//! | Attempt | Request                        | Sleep after      |
//! |---------|--------------------------------|------------------|
//! | 1–3     | high accuracy, 3 s timeout     | 300 ms           |
//! | 4–12    | high accuracy, 5 s timeout     | 300 ms (not 12)  |
//! | 5 fails | + one low-accuracy one-shot    | —                |

use std::time::Duration;

use medrush_core::{Coordinates, PositionSample};
use tokio_util::sync::CancellationToken;

use crate::sensor::{GeoSensor, PermissionState, PositionOptions, SensorError};

/// Accuracy reported for the fallback coordinate.
pub const FALLBACK_ACCURACY_METERS: f64 = 1000.0;

/// Number of full passes allowed after the first one comes back empty.
const MAX_OUTER_RETRIES: u32 = 1;

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub max_attempts: u32,
    /// Timeout for attempts after the early ones.
    pub per_attempt_timeout: Duration,
    /// Timeout for the first `early_attempts` attempts (capped at
    /// `per_attempt_timeout`).
    pub early_attempt_timeout: Duration,
    pub early_attempts: u32,
    pub high_accuracy_first: bool,
    /// Attempt number whose failure triggers the one-shot low-accuracy read.
    pub low_accuracy_attempt: u32,
    /// Stop sampling as soon as the best accuracy is strictly below this.
    pub good_enough_meters: f64,
    pub inter_attempt_delay: Duration,
    pub outer_retry_delay: Duration,
    pub fallback: Coordinates,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            per_attempt_timeout: Duration::from_secs(5),
            early_attempt_timeout: Duration::from_secs(3),
            early_attempts: 3,
            high_accuracy_first: true,
            low_accuracy_attempt: 5,
            good_enough_meters: 100.0,
            inter_attempt_delay: Duration::from_millis(300),
            outer_retry_delay: Duration::from_millis(500),
            fallback: Coordinates::new(28.6139, 77.2090),
        }
    }
}

impl AcquireOptions {
    #[must_use]
    pub fn with_fallback(mut self, fallback: Coordinates) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Options with every sleep removed.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.inter_attempt_delay = Duration::ZERO;
        self.outer_retry_delay = Duration::ZERO;
        self
    }

    fn timeout_for(&self, attempt: u32) -> Duration {
        if attempt <= self.early_attempts {
            self.early_attempt_timeout.min(self.per_attempt_timeout)
        } else {
            self.per_attempt_timeout
        }
    }

    fn request(&self, attempt: u32) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.high_accuracy_first,
            timeout: self.timeout_for(attempt),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Mutable bookkeeping for one acquisition call.
#[derive(Debug, Clone)]
pub struct LocationAcquisitionState {
    pub best_sample: Option<PositionSample>,
    pub best_accuracy_meters: f64,
    pub attempts_made: u32,
    pub high_accuracy_mode_failed: bool,
    pub permission_denied: bool,
}

impl Default for LocationAcquisitionState {
    fn default() -> Self {
        Self {
            best_sample: None,
            best_accuracy_meters: f64::INFINITY,
            attempts_made: 0,
            high_accuracy_mode_failed: false,
            permission_denied: false,
        }
    }
}

impl LocationAcquisitionState {
    /// Folds a reading into the best-so-far. Only a strictly lower accuracy
    /// replaces the current best, so the first of several equal readings wins.
    pub fn consider(&mut self, sample: PositionSample) -> bool {
        if sample.accuracy_meters < self.best_accuracy_meters {
            self.best_accuracy_meters = sample.accuracy_meters;
            self.best_sample = Some(sample);
            true
        } else {
            false
        }
    }

    fn good_enough(&self, threshold_meters: f64) -> bool {
        self.best_accuracy_meters < threshold_meters
    }
}

/// Why the fallback coordinate was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    PermissionDenied,
    Unavailable,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::PermissionDenied => write!(
                f,
                "Location permission denied. Enable location access or enter your address manually."
            ),
            FallbackReason::Unavailable => write!(
                f,
                "Could not get an accurate position. Move the pin to your exact location."
            ),
        }
    }
}

/// Informational accuracy band for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyTier {
    /// 100 m or better.
    Good,
    /// Worse than 100 m, up to 1000 m.
    Limited,
    /// Worse than 1000 m.
    VeryLimited,
}

impl AccuracyTier {
    #[must_use]
    pub fn classify(accuracy_meters: f64) -> Self {
        if accuracy_meters > 1000.0 {
            AccuracyTier::VeryLimited
        } else if accuracy_meters > 100.0 {
            AccuracyTier::Limited
        } else {
            AccuracyTier::Good
        }
    }

    #[must_use]
    pub fn warning(self) -> Option<&'static str> {
        match self {
            AccuracyTier::Good => None,
            AccuracyTier::Limited => {
                Some("Location accuracy is limited. Check the pin before confirming.")
            }
            AccuracyTier::VeryLimited => Some(
                "Location accuracy is very limited. Drag the pin to your exact address.",
            ),
        }
    }
}

/// The position an acquisition settled on.
#[derive(Debug, Clone)]
pub struct LocationFix {
    pub sample: PositionSample,
    /// `Some` when `sample` is the fallback coordinate.
    pub fallback: Option<FallbackReason>,
    /// High-accuracy attempts across all passes.
    pub attempts_made: u32,
    pub passes: u32,
    pub high_accuracy_mode_failed: bool,
}

impl LocationFix {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    #[must_use]
    pub fn accuracy_tier(&self) -> AccuracyTier {
        AccuracyTier::classify(self.sample.accuracy_meters)
    }

    /// The message to show the user, if any: the failure reason for a
    /// fallback fix, otherwise the accuracy warning.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self.fallback {
            Some(reason) => Some(reason.to_string()),
            None => self.accuracy_tier().warning().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AcquireOutcome {
    Located(LocationFix),
    Cancelled,
}

impl AcquireOutcome {
    #[must_use]
    pub fn fix(&self) -> Option<&LocationFix> {
        match self {
            AcquireOutcome::Located(fix) => Some(fix),
            AcquireOutcome::Cancelled => None,
        }
    }

    #[must_use]
    pub fn into_fix(self) -> Option<LocationFix> {
        match self {
            AcquireOutcome::Located(fix) => Some(fix),
            AcquireOutcome::Cancelled => None,
        }
    }
}

enum PassEnd {
    Finished,
    Cancelled,
}

/// Acquire the most accurate position the sensor will give within the
/// attempt budget.
///
/// Never fails: exhaustion yields the fallback coordinate at
/// [`FALLBACK_ACCURACY_METERS`]. Cancelling `cancel` aborts the in-flight
/// sensor call or sleep and returns [`AcquireOutcome::Cancelled`].
pub async fn acquire<S: GeoSensor>(
    sensor: &S,
    options: &AcquireOptions,
    cancel: &CancellationToken,
) -> AcquireOutcome {
    let mut state = LocationAcquisitionState::default();

    let permission = tokio::select! {
        biased;
        () = cancel.cancelled() => return AcquireOutcome::Cancelled,
        p = sensor.permission() => p,
    };
    if permission == PermissionState::Denied {
        tracing::warn!("location permission denied; skipping sensor attempts");
        state.permission_denied = true;
        return AcquireOutcome::Located(fallback_fix(options, &state, 0));
    }

    let mut passes = 0u32;
    loop {
        passes += 1;
        if let PassEnd::Cancelled = run_pass(sensor, options, cancel, &mut state).await {
            return AcquireOutcome::Cancelled;
        }

        if let Some(sample) = state.best_sample {
            tracing::debug!(
                accuracy_meters = sample.accuracy_meters,
                attempts = state.attempts_made,
                passes,
                "location acquired"
            );
            return AcquireOutcome::Located(LocationFix {
                sample,
                fallback: None,
                attempts_made: state.attempts_made,
                passes,
                high_accuracy_mode_failed: state.high_accuracy_mode_failed,
            });
        }

        if state.permission_denied || passes > MAX_OUTER_RETRIES {
            return AcquireOutcome::Located(fallback_fix(options, &state, passes));
        }

        tracing::warn!(
            attempts = state.attempts_made,
            delay_ms = u64::try_from(options.outer_retry_delay.as_millis()).unwrap_or(u64::MAX),
            "no position obtained; retrying acquisition once"
        );
        if !sleep_or_cancel(options.outer_retry_delay, cancel).await {
            return AcquireOutcome::Cancelled;
        }
    }
}

async fn run_pass<S: GeoSensor>(
    sensor: &S,
    options: &AcquireOptions,
    cancel: &CancellationToken,
    state: &mut LocationAcquisitionState,
) -> PassEnd {
    for attempt in 1..=options.max_attempts {
        state.attempts_made += 1;
        let request = options.request(attempt);

        let reading = tokio::select! {
            biased;
            () = cancel.cancelled() => return PassEnd::Cancelled,
            r = sensor.current_position(request) => r,
        };

        match reading {
            Ok(sample) => {
                if state.consider(sample) {
                    tracing::debug!(
                        attempt,
                        accuracy_meters = sample.accuracy_meters,
                        "new best position"
                    );
                }
            }
            Err(SensorError::PermissionDenied) => {
                tracing::warn!(attempt, "location permission revoked during acquisition");
                state.permission_denied = true;
                return PassEnd::Finished;
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "position attempt failed");
                // The lenient retry only differs when the failed request asked
                // for high accuracy.
                if attempt == options.low_accuracy_attempt && request.enable_high_accuracy {
                    state.high_accuracy_mode_failed = true;
                    let lenient = PositionOptions {
                        enable_high_accuracy: false,
                        ..request
                    };
                    let reading = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return PassEnd::Cancelled,
                        r = sensor.current_position(lenient) => r,
                    };
                    match reading {
                        Ok(sample) => {
                            state.consider(sample);
                        }
                        Err(SensorError::PermissionDenied) => {
                            state.permission_denied = true;
                            return PassEnd::Finished;
                        }
                        Err(err) => {
                            tracing::warn!(
                                attempt,
                                error = %err,
                                "low-accuracy position attempt failed"
                            );
                        }
                    }
                }
            }
        }

        if state.good_enough(options.good_enough_meters) {
            return PassEnd::Finished;
        }

        if attempt < options.max_attempts
            && !sleep_or_cancel(options.inter_attempt_delay, cancel).await
        {
            return PassEnd::Cancelled;
        }
    }
    PassEnd::Finished
}

/// Sleeps for `delay`; returns `false` if cancelled first.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

fn fallback_fix(
    options: &AcquireOptions,
    state: &LocationAcquisitionState,
    passes: u32,
) -> LocationFix {
    let reason = if state.permission_denied {
        FallbackReason::PermissionDenied
    } else {
        FallbackReason::Unavailable
    };
    tracing::warn!(
        reason = ?reason,
        attempts = state.attempts_made,
        latitude = options.fallback.latitude,
        longitude = options.fallback.longitude,
        "using fallback location"
    );
    LocationFix {
        sample: PositionSample::new(
            options.fallback.latitude,
            options.fallback.longitude,
            FALLBACK_ACCURACY_METERS,
        ),
        fallback: Some(reason),
        attempts_made: state.attempts_made,
        passes,
        high_accuracy_mode_failed: state.high_accuracy_mode_failed,
    }
}

#[cfg(test)]
#[path = "acquire_test.rs"]
mod tests;
