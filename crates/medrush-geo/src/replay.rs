//! A [`GeoSensor`] that plays back a fixed script of readings.
//!
//! Used by the CLI (`medrush locate --script readings.json`) where no device
//! sensor exists, and by the acquirer tests to drive exact sequences.
//!
//! Script file shape:
//!
//! ```json
//! {
//!   "permission": "granted",
//!   "readings": [
//!     { "latitude": 28.61, "longitude": 77.20, "accuracyMeters": 350.0 },
//!     { "error": "timeout" }
//!   ]
//! }
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use medrush_core::PositionSample;
use serde::Deserialize;

use crate::sensor::{GeoSensor, PermissionState, PositionOptions, SensorError};

/// One scripted sensor response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedReading {
    Sample(PositionSample),
    Error { error: SensorError },
}

impl From<PositionSample> for ScriptedReading {
    fn from(sample: PositionSample) -> Self {
        Self::Sample(sample)
    }
}

impl From<SensorError> for ScriptedReading {
    fn from(error: SensorError) -> Self {
        Self::Error { error }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub permission: PermissionState,
    #[serde(default)]
    pub readings: Vec<ScriptedReading>,
}

impl ReplayScript {
    /// Reads a script from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or an
    /// `InvalidData` error if it is not a valid script.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Plays back scripted readings in order. Once the script runs out every
/// further request fails with [`SensorError::PositionUnavailable`].
#[derive(Debug)]
pub struct ReplaySensor {
    permission: PermissionState,
    readings: Mutex<VecDeque<ScriptedReading>>,
    requests: Mutex<Vec<PositionOptions>>,
}

impl ReplaySensor {
    #[must_use]
    pub fn new(permission: PermissionState, readings: Vec<ScriptedReading>) -> Self {
        Self {
            permission,
            readings: Mutex::new(readings.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn from_script(script: ReplayScript) -> Self {
        Self::new(script.permission, script.readings)
    }

    /// Every request made so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<PositionOptions> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of scripted readings not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_reading(&self, options: PositionOptions) -> Result<PositionSample, SensorError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options);
        let next = self
            .readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(ScriptedReading::Sample(sample)) => Ok(sample),
            Some(ScriptedReading::Error { error }) => Err(error),
            None => Err(SensorError::PositionUnavailable),
        }
    }
}

impl GeoSensor for ReplaySensor {
    async fn permission(&self) -> PermissionState {
        self.permission
    }

    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<PositionSample, SensorError> {
        self.next_reading(options)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn opts() -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(3),
            maximum_age: Duration::ZERO,
        }
    }

    #[test]
    fn parses_script_with_samples_and_errors() {
        let raw = r#"{
            "permission": "granted",
            "readings": [
                { "latitude": 28.61, "longitude": 77.2, "accuracyMeters": 350.0 },
                { "error": "timeout" },
                { "error": "permission_denied" }
            ]
        }"#;
        let script: ReplayScript = serde_json::from_str(raw).unwrap();
        assert_eq!(script.permission, PermissionState::Granted);
        assert_eq!(script.readings.len(), 3);
        assert!(matches!(
            script.readings[0],
            ScriptedReading::Sample(s) if (s.accuracy_meters - 350.0).abs() < f64::EPSILON
        ));
        assert_eq!(
            script.readings[1],
            ScriptedReading::Error {
                error: SensorError::Timeout
            }
        );
        assert_eq!(
            script.readings[2],
            ScriptedReading::Error {
                error: SensorError::PermissionDenied
            }
        );
    }

    #[test]
    fn missing_permission_defaults_to_prompt() {
        let script: ReplayScript = serde_json::from_str(r#"{"readings": []}"#).unwrap();
        assert_eq!(script.permission, PermissionState::Prompt);
    }

    #[tokio::test]
    async fn exhausted_script_reports_unavailable() {
        let sensor = ReplaySensor::new(
            PermissionState::Granted,
            vec![PositionSample::new(1.0, 2.0, 50.0).into()],
        );
        assert!(sensor.current_position(opts()).await.is_ok());
        assert_eq!(
            sensor.current_position(opts()).await,
            Err(SensorError::PositionUnavailable)
        );
        assert_eq!(sensor.requests().len(), 2);
        assert_eq!(sensor.remaining(), 0);
    }
}
