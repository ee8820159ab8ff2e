use std::path::PathBuf;

use crate::location::Coordinates;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub geocoding_base_url: String,
    pub maps_api_key: Option<String>,
    pub vision_base_url: String,
    pub vision_api_key: Option<String>,
    pub genai_base_url: String,
    pub genai_api_key: Option<String>,
    pub genai_model: String,
    pub dashboard_url: String,
    pub dashboard_max_retries: u32,
    pub dashboard_backoff_base_ms: u64,
    pub dashboard_backoff_cap_ms: u64,
    pub location_max_attempts: u32,
    /// Default city-center coordinate used when live positioning fails.
    pub fallback_location: Coordinates,
}

impl AppConfig {
    /// Returns the maps/geocoding API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `MEDRUSH_MAPS_API_KEY` was not set.
    pub fn require_maps_key(&self) -> Result<&str, ConfigError> {
        self.maps_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MEDRUSH_MAPS_API_KEY".to_string()))
    }

    /// Returns the vision API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `MEDRUSH_VISION_API_KEY` was not set.
    pub fn require_vision_key(&self) -> Result<&str, ConfigError> {
        self.vision_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MEDRUSH_VISION_API_KEY".to_string()))
    }

    /// Returns the generative-model API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `MEDRUSH_GENAI_API_KEY` was not set.
    pub fn require_genai_key(&self) -> Result<&str, ConfigError> {
        self.genai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MEDRUSH_GENAI_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("geocoding_base_url", &self.geocoding_base_url)
            .field("maps_api_key", &redact(&self.maps_api_key))
            .field("vision_base_url", &self.vision_base_url)
            .field("vision_api_key", &redact(&self.vision_api_key))
            .field("genai_base_url", &self.genai_base_url)
            .field("genai_api_key", &redact(&self.genai_api_key))
            .field("genai_model", &self.genai_model)
            .field("dashboard_url", &self.dashboard_url)
            .field("dashboard_max_retries", &self.dashboard_max_retries)
            .field("dashboard_backoff_base_ms", &self.dashboard_backoff_base_ms)
            .field("dashboard_backoff_cap_ms", &self.dashboard_backoff_cap_ms)
            .field("location_max_attempts", &self.location_max_attempts)
            .field("fallback_location", &self.fallback_location)
            .finish()
    }
}
