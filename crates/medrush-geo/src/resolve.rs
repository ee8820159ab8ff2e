//! Acquire-then-reverse-geocode, as the address selection flow does it.

use medrush_core::ResolvedAddress;
use tokio_util::sync::CancellationToken;

use crate::acquire::{acquire, AcquireOptions, LocationFix};
use crate::geocode::ReverseGeocoder;
use crate::sensor::GeoSensor;

#[derive(Debug, Clone)]
pub struct LocatedAddress {
    pub fix: LocationFix,
    /// Address for exactly `fix.sample`'s coordinates.
    pub address: ResolvedAddress,
}

/// Acquires a position and resolves it to an address.
///
/// A geocoding failure is logged and degrades to the placeholder address for
/// the same coordinates. Returns `None` only when `cancel` fires.
pub async fn locate_and_resolve<S, G>(
    sensor: &S,
    geocoder: &G,
    options: &AcquireOptions,
    cancel: &CancellationToken,
) -> Option<LocatedAddress>
where
    S: GeoSensor,
    G: ReverseGeocoder,
{
    let fix = acquire(sensor, options, cancel).await.into_fix()?;
    let (latitude, longitude) = (fix.sample.latitude, fix.sample.longitude);

    let resolved = tokio::select! {
        biased;
        () = cancel.cancelled() => return None,
        r = geocoder.resolve_address(latitude, longitude) => r,
    };

    let address = match resolved {
        Ok(mut address) => {
            // Pin to the sample even if a geocoder reports a snapped point.
            address.latitude = latitude;
            address.longitude = longitude;
            address
        }
        Err(err) => {
            tracing::warn!(
                latitude,
                longitude,
                error = %err,
                "reverse geocoding failed; using placeholder address"
            );
            ResolvedAddress::unknown_at(latitude, longitude)
        }
    };

    Some(LocatedAddress { fix, address })
}
