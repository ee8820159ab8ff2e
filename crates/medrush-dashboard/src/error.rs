use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The dashboard answered with a non-2xx status.
    #[error("dashboard returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid dashboard base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
