use crate::app_config::{AppConfig, Environment};
use crate::location::Coordinates;
use crate::ConfigError;

/// New Delhi city center; used when neither the sensor nor the environment
/// supplies a better default.
const DEFAULT_FALLBACK_LAT: &str = "28.6139";
const DEFAULT_FALLBACK_LNG: &str = "77.2090";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank keys (`KEY=` in a .env file) count as unset.
    let optional_key = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("MEDRUSH_ENV", "development"))?;
    let log_level = or_default("MEDRUSH_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("MEDRUSH_DATA_DIR", "./.medrush"));

    let http_timeout_secs = parse_u64("MEDRUSH_HTTP_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("MEDRUSH_USER_AGENT", "medrush/0.1 (medicine-delivery)");

    let geocoding_base_url = or_default(
        "MEDRUSH_GEOCODING_BASE_URL",
        "https://maps.googleapis.com",
    );
    let maps_api_key = optional_key("MEDRUSH_MAPS_API_KEY");
    let vision_base_url = or_default("MEDRUSH_VISION_BASE_URL", "https://vision.googleapis.com");
    let vision_api_key = optional_key("MEDRUSH_VISION_API_KEY");
    let genai_base_url = or_default(
        "MEDRUSH_GENAI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let genai_api_key = optional_key("MEDRUSH_GENAI_API_KEY");
    let genai_model = or_default("MEDRUSH_GENAI_MODEL", "gemini-1.5-flash");

    let dashboard_url = or_default("MEDRUSH_DASHBOARD_URL", "http://localhost:4000/api");
    let dashboard_max_retries = parse_u32("MEDRUSH_DASHBOARD_MAX_RETRIES", "3")?;
    let dashboard_backoff_base_ms = parse_u64("MEDRUSH_DASHBOARD_BACKOFF_BASE_MS", "1000")?;
    let dashboard_backoff_cap_ms = parse_u64("MEDRUSH_DASHBOARD_BACKOFF_CAP_MS", "10000")?;

    let location_max_attempts = parse_u32("MEDRUSH_LOCATION_MAX_ATTEMPTS", "12")?;
    if location_max_attempts == 0 {
        return Err(invalid(
            "MEDRUSH_LOCATION_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let fallback_lat = parse_f64("MEDRUSH_FALLBACK_LAT", DEFAULT_FALLBACK_LAT)?;
    if !(-90.0..=90.0).contains(&fallback_lat) {
        return Err(invalid(
            "MEDRUSH_FALLBACK_LAT",
            format!("{fallback_lat} is outside [-90, 90]"),
        ));
    }
    let fallback_lng = parse_f64("MEDRUSH_FALLBACK_LNG", DEFAULT_FALLBACK_LNG)?;
    if !(-180.0..=180.0).contains(&fallback_lng) {
        return Err(invalid(
            "MEDRUSH_FALLBACK_LNG",
            format!("{fallback_lng} is outside [-180, 180]"),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        data_dir,
        http_timeout_secs,
        user_agent,
        geocoding_base_url,
        maps_api_key,
        vision_base_url,
        vision_api_key,
        genai_base_url,
        genai_api_key,
        genai_model,
        dashboard_url,
        dashboard_max_retries,
        dashboard_backoff_base_ms,
        dashboard_backoff_cap_ms,
        location_max_attempts,
        fallback_location: Coordinates::new(fallback_lat, fallback_lng),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MEDRUSH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
