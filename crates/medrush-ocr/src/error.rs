use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered but reported an error of its own.
    #[error("{provider} returned an error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned no content")]
    EmptyResponse { provider: &'static str },

    #[error("invalid {provider} base URL '{url}': {reason}")]
    InvalidBaseUrl {
        provider: &'static str,
        url: String,
        reason: String,
    },

    #[error("all OCR providers failed (vision: {vision}; generative: {generative})")]
    AllProvidersFailed { vision: String, generative: String },
}
