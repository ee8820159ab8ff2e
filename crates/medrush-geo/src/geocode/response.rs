//! Typed view of the provider's geocoding JSON and its mapping onto
//! [`ResolvedAddress`].

use medrush_core::ResolvedAddress;
use serde::Deserialize;

pub(crate) const STATUS_OK: &str = "OK";
pub(crate) const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResult {
    /// `long_name` of the first component tagged with `kind`.
    fn component(&self, kind: &str) -> Option<&str> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.as_str())
    }

    /// Maps this result onto an address pinned to `latitude`/`longitude`.
    ///
    /// A result with no components at all becomes the placeholder address.
    pub(crate) fn to_address(&self, latitude: f64, longitude: f64) -> ResolvedAddress {
        if self.address_components.is_empty() {
            return ResolvedAddress::unknown_at(latitude, longitude);
        }

        let full_address = self
            .formatted_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(
                || format!("Location at {latitude:.6}, {longitude:.6}"),
                str::to_string,
            );

        ResolvedAddress {
            full_address,
            latitude,
            longitude,
            city: self
                .component("locality")
                .unwrap_or(ResolvedAddress::UNKNOWN_CITY)
                .to_string(),
            state: self
                .component("administrative_area_level_1")
                .unwrap_or(ResolvedAddress::UNKNOWN_STATE)
                .to_string(),
            zip_code: self
                .component("postal_code")
                .unwrap_or(ResolvedAddress::UNKNOWN_ZIP)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: serde_json::Value) -> GeocodeResponse {
        serde_json::from_value(raw).expect("fixture should parse")
    }

    #[test]
    fn extracts_city_state_and_postal_code_by_type() {
        let response = parse(serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "12 MG Road, Bengaluru, Karnataka 560001, India",
                "address_components": [
                    { "long_name": "12", "types": ["street_number"] },
                    { "long_name": "Bengaluru", "types": ["locality", "political"] },
                    { "long_name": "Karnataka", "types": ["administrative_area_level_1", "political"] },
                    { "long_name": "560001", "types": ["postal_code"] }
                ],
                "geometry": { "location": { "lat": 12.9750, "lng": 77.6060 } }
            }]
        }));
        let addr = response.results[0].to_address(12.97, 77.60);
        assert_eq!(addr.city, "Bengaluru");
        assert_eq!(addr.state, "Karnataka");
        assert_eq!(addr.zip_code, "560001");
        assert_eq!(
            addr.full_address,
            "12 MG Road, Bengaluru, Karnataka 560001, India"
        );
        assert!((addr.latitude - 12.97).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_components_fall_back_individually() {
        let response = parse(serde_json::json!({
            "status": "OK",
            "results": [{
                "address_components": [
                    { "long_name": "Pune", "types": ["locality"] }
                ]
            }]
        }));
        let addr = response.results[0].to_address(18.52, 73.85);
        assert_eq!(addr.city, "Pune");
        assert_eq!(addr.state, "Unknown State");
        assert_eq!(addr.zip_code, "000000");
        assert_eq!(addr.full_address, "Location at 18.520000, 73.850000");
    }

    #[test]
    fn empty_components_produce_placeholder_address() {
        let response = parse(serde_json::json!({
            "status": "OK",
            "results": [{ "formatted_address": "Somewhere", "address_components": [] }]
        }));
        let addr = response.results[0].to_address(1.0, 2.0);
        assert_eq!(addr, ResolvedAddress::unknown_at(1.0, 2.0));
    }
}
