//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CORN_API_URL` - Base URL of the purchase API (default: `http://127.0.0.1:3000/api`)
//! - `CORN_REQUEST_TIMEOUT_SECS` - Purchase request timeout in seconds (default: 10)
//! - `CORN_DEFAULT_RETRY_AFTER_SECS` - Cooldown used when a rejection carries no retry hint (default: 60)
//! - `CORN_STATE_PATH` - File holding the client identity (default: `<data dir>/bobs-corn/state.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";
const DEFAULT_TIMEOUT_SECS: &str = "10";

/// Cooldown applied when the server rejects a purchase without saying how
/// long to wait.
pub const DEFAULT_RETRY_AFTER_SECS: u32 = 60;

/// Directory name under the platform data dir.
const STATE_DIR_NAME: &str = "bobs-corn";
const STATE_FILE_NAME: &str = "state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Could not determine a data directory; set CORN_STATE_PATH")]
    NoDataDir,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Purchase API settings
    pub api: ApiConfig,
    /// Where the client identity is persisted
    pub state_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Purchase API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; the purchase endpoint is `<base_url>/buy`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Cooldown used when neither retry hint is present
    pub default_retry_after_secs: u32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if no
    /// state path is configured and the platform has no data directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let state_path = match get_optional_env("CORN_STATE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_state_path()?,
        };

        Ok(Self {
            api,
            state_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default("CORN_API_URL", DEFAULT_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("CORN_API_URL".to_string(), e))?;

        let timeout_secs = get_env_or_default("CORN_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CORN_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CORN_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let default_retry_after_secs = get_env_or_default(
            "CORN_DEFAULT_RETRY_AFTER_SECS",
            &DEFAULT_RETRY_AFTER_SECS.to_string(),
        )
        .parse::<u32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CORN_DEFAULT_RETRY_AFTER_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            default_retry_after_secs,
        })
    }

    /// Build an API config for the given base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not a valid http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CORN_API_URL".to_string(), e))?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(10),
            default_retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        })
    }

    /// The purchase endpoint, `<base_url>/buy`.
    #[must_use]
    pub fn buy_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("buy");
        }
        url
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate the API base URL.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// Default location of the identity file.
fn default_state_path() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(STATE_DIR_NAME).join(STATE_FILE_NAME))
        .ok_or(ConfigError::NoDataDir)
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_url_without_trailing_slash() {
        let api = ApiConfig::with_base_url("http://localhost:3000/api").unwrap();
        assert_eq!(api.buy_url().as_str(), "http://localhost:3000/api/buy");
    }

    #[test]
    fn test_buy_url_with_trailing_slash() {
        let api = ApiConfig::with_base_url("http://localhost:3000/api/").unwrap();
        assert_eq!(api.buy_url().as_str(), "http://localhost:3000/api/buy");
    }

    #[test]
    fn test_buy_url_root() {
        let api = ApiConfig::with_base_url("https://corn.example.net").unwrap();
        assert_eq!(api.buy_url().as_str(), "https://corn.example.net/buy");
    }

    #[test]
    fn test_with_base_url_defaults() {
        let api = ApiConfig::with_base_url("http://localhost:3000/api").unwrap();
        assert_eq!(api.timeout, Duration::from_secs(10));
        assert_eq!(api.default_retry_after_secs, 60);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = ApiConfig::with_base_url("ftp://localhost/api");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(ApiConfig::with_base_url("not a url").is_err());
    }
}
