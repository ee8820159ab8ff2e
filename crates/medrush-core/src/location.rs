//! Position and address types shared by the geolocation, cart, and CLI crates.

use serde::{Deserialize, Serialize};

/// A plain latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One reading from the device location sensor.
///
/// Never persisted: samples are consumed immediately to update caller state
/// or to reverse-geocode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters; lower is better.
    pub accuracy_meters: f64,
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl PositionSample {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A human-readable address derived from coordinates.
///
/// When produced by reverse geocoding, `latitude`/`longitude` are always the
/// coordinates that were looked up, never the provider's snapped point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub full_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ResolvedAddress {
    pub const UNKNOWN_CITY: &'static str = "Unknown City";
    pub const UNKNOWN_STATE: &'static str = "Unknown State";
    pub const UNKNOWN_ZIP: &'static str = "000000";

    /// Builds the placeholder address used when a provider has nothing to say
    /// about a coordinate.
    #[must_use]
    pub fn unknown_at(latitude: f64, longitude: f64) -> Self {
        Self {
            full_address: format!("Location at {latitude:.6}, {longitude:.6}"),
            latitude,
            longitude,
            city: Self::UNKNOWN_CITY.to_string(),
            state: Self::UNKNOWN_STATE.to_string(),
            zip_code: Self::UNKNOWN_ZIP.to_string(),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_address_uses_placeholder_fields() {
        let addr = ResolvedAddress::unknown_at(12.5, 77.25);
        assert_eq!(addr.full_address, "Location at 12.500000, 77.250000");
        assert_eq!(addr.city, "Unknown City");
        assert_eq!(addr.state, "Unknown State");
        assert_eq!(addr.zip_code, "000000");
        assert_eq!(addr.coordinates(), Coordinates::new(12.5, 77.25));
    }

    #[test]
    fn position_sample_serializes_camel_case() {
        let sample = PositionSample {
            latitude: 1.0,
            longitude: 2.0,
            accuracy_meters: 30.0,
            timestamp_ms: 5,
        };
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["accuracyMeters"], 30.0);
        assert_eq!(json["timestampMs"], 5);
    }
}
