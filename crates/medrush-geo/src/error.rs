use thiserror::Error;

/// Errors returned by the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-`OK` status.
    #[error("geocoding provider returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no address found for \"{query}\"")]
    NotFound { query: String },

    #[error("search result for \"{query}\" has no coordinates")]
    MissingGeometry { query: String },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("invalid geocoding base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
