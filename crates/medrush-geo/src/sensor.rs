//! The platform location sensor, seen through the narrow interface the
//! acquirer needs.

use std::future::Future;
use std::time::Duration;

use medrush_core::PositionSample;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform-reported location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
}

/// Options for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for GPS-grade positioning instead of network/cell positioning.
    pub enable_high_accuracy: bool,
    /// Time budget the sensor enforces for this one reading.
    pub timeout: Duration,
    /// Maximum age of a cached reading the sensor may return. The acquirer
    /// always sends zero.
    pub maximum_age: Duration,
}

/// Failure of a single sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("position request timed out")]
    Timeout,
}

/// A source of position readings.
///
/// Implementations must honour `options.timeout` themselves; the acquirer
/// does not wrap calls in an external timer.
pub trait GeoSensor {
    /// Current permission state, queried without prompting where possible.
    fn permission(&self) -> impl Future<Output = PermissionState> + Send;

    /// Request one fresh reading.
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<PositionSample, SensorError>> + Send;
}
