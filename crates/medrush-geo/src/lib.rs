//! Device positioning and address resolution.
//!
//! [`acquire`] samples a [`GeoSensor`] repeatedly and keeps the most accurate
//! reading, degrading to a fixed fallback coordinate when nothing usable is
//! returned. [`GeocodingClient`] turns coordinates into addresses and back.

pub mod acquire;
pub mod error;
pub mod geocode;
pub mod replay;
pub mod resolve;
pub mod sensor;

pub use acquire::{
    acquire, AccuracyTier, AcquireOptions, AcquireOutcome, FallbackReason,
    LocationAcquisitionState, LocationFix,
};
pub use error::GeocodeError;
pub use geocode::{GeocodingClient, ReverseGeocoder};
pub use replay::{ReplayScript, ReplaySensor, ScriptedReading};
pub use resolve::{locate_and_resolve, LocatedAddress};
pub use sensor::{GeoSensor, PermissionState, PositionOptions, SensorError};
