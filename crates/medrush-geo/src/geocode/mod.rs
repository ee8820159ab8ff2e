//! HTTP client for a Google-Geocoding-shaped API.
//!
//! Two operations: reverse geocoding (coordinates to address) and forward
//! search (free text to address). Responses are parsed into typed structs at
//! the boundary; no retries beyond what `reqwest` does itself.

mod response;

use std::future::Future;
use std::time::Duration;

use medrush_core::ResolvedAddress;
use reqwest::{Client, Url};

use crate::error::GeocodeError;
use response::{GeocodeResponse, STATUS_OK, STATUS_ZERO_RESULTS};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const GEOCODE_PATH: &str = "maps/api/geocode/json";

/// Anything that can turn coordinates into an address.
pub trait ReverseGeocoder {
    fn resolve_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<ResolvedAddress, GeocodeError>> + Send;
}

/// Client for the geocoding provider.
///
/// Use [`GeocodingClient::new`] for production or
/// [`GeocodingClient::with_base_url`] to point at a mock server in tests.
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl GeocodingClient {
    /// Creates a client pointed at the production provider.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(GEOCODE_PATH))
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
        })
    }

    /// Resolves coordinates to an address.
    ///
    /// The returned address always carries the input coordinates. When the
    /// provider has no result for the point, a placeholder address
    /// (`"Location at {lat}, {lng}"`) is returned instead of an error.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`] on network failure or non-2xx status.
    /// - [`GeocodeError::Api`] if the provider reports an error status.
    /// - [`GeocodeError::Deserialize`] if the body does not match the expected shape.
    pub async fn resolve_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ResolvedAddress, GeocodeError> {
        let latlng = format!("{latitude},{longitude}");
        let response = self
            .request(&[("latlng", &latlng)], &format!("reverse({latlng})"))
            .await?;

        match response.status.as_str() {
            STATUS_OK => Ok(response.results.first().map_or_else(
                || ResolvedAddress::unknown_at(latitude, longitude),
                |r| r.to_address(latitude, longitude),
            )),
            STATUS_ZERO_RESULTS => {
                tracing::debug!(latitude, longitude, "no reverse geocoding result");
                Ok(ResolvedAddress::unknown_at(latitude, longitude))
            }
            _ => Err(api_error(response)),
        }
    }

    /// Searches for an address by free text and returns the top match.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::EmptyQuery`] if `query` is blank.
    /// - [`GeocodeError::NotFound`] if the provider has no match.
    /// - [`GeocodeError::MissingGeometry`] if the match carries no coordinates.
    /// - [`GeocodeError::Http`], [`GeocodeError::Api`], [`GeocodeError::Deserialize`]
    ///   as for [`GeocodingClient::resolve_address`].
    pub async fn search_address(&self, query: &str) -> Result<ResolvedAddress, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let response = self
            .request(&[("address", query)], &format!("search({query})"))
            .await?;

        match response.status.as_str() {
            STATUS_OK => {}
            STATUS_ZERO_RESULTS => {
                return Err(GeocodeError::NotFound {
                    query: query.to_owned(),
                })
            }
            _ => return Err(api_error(response)),
        }

        let top = response
            .results
            .first()
            .ok_or_else(|| GeocodeError::NotFound {
                query: query.to_owned(),
            })?;
        let location = top
            .geometry
            .as_ref()
            .map(|g| &g.location)
            .ok_or_else(|| GeocodeError::MissingGeometry {
                query: query.to_owned(),
            })?;

        Ok(top.to_address(location.lat, location.lng))
    }

    fn build_url(&self, extra: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        url
    }

    async fn request(
        &self,
        params: &[(&str, &str)],
        context: &str,
    ) -> Result<GeocodeResponse, GeocodeError> {
        let url = self.build_url(params);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

impl ReverseGeocoder for GeocodingClient {
    fn resolve_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<ResolvedAddress, GeocodeError>> + Send {
        GeocodingClient::resolve_address(self, latitude, longitude)
    }
}

fn api_error(response: GeocodeResponse) -> GeocodeError {
    GeocodeError::Api {
        message: response
            .error_message
            .unwrap_or_else(|| "no error message".to_string()),
        status: response.status,
    }
}
