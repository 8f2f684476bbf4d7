//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SUPPORT_DESK_HOSTNAME` - Runtime hostname, selects the run mode (default: localhost)
//! - `SUPPORT_DESK_API_URL` - Backend base URL (default: derived from the run mode)
//! - `SUPPORT_DESK_SESSION_TOKEN` - Bearer token for authenticated requests
//! - `SUPPORT_DESK_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `SUPPORT_DESK_DEMO_MODE` - Use the local demo store instead of the backend (default: false)
//! - `SUPPORT_DESK_DATA_DIR` - Demo store directory (default: .support-desk)
//! - `SUPPORT_DESK_REPLY_DELAY_MS` - Simulated assistant reply delay (default: 1500)
//! - `SUPPORT_DESK_STALE_SECS` - Query staleness window (default: 30)
//! - `SUPPORT_DESK_LOW_STOCK` - Low-stock threshold for the dashboard (default: 5)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::api::RetryPolicy;

const DEFAULT_HOSTNAME: &str = "localhost";
const DEVELOPMENT_API_URL: &str = "http://localhost:3001/api";
const DEFAULT_DATA_DIR: &str = ".support-desk";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Whether the console runs against a local development backend or production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl RunMode {
    /// Detect the run mode from the runtime hostname.
    #[must_use]
    pub fn detect(hostname: &str) -> Self {
        let host = hostname.trim().to_ascii_lowercase();
        if host.is_empty()
            || host == "localhost"
            || host == "127.0.0.1"
            || host == "::1"
            || host == "0.0.0.0"
            || host.ends_with(".local")
            || host.ends_with(".localhost")
        {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Remote backend configuration.
///
/// Implements `Debug` manually to redact the session token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint is resolved against.
    pub base_url: Url,
    /// Bearer token attached to requests that require auth.
    pub session_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff policy for GET requests.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration for a backend at `base_url` with default timeout and retry.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            session_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Demo-mode configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Whether the local demo store replaces the backend.
    pub enabled: bool,
    /// Directory holding the persisted demo store.
    pub data_dir: PathBuf,
    /// Delay before the simulated assistant answers.
    pub reply_delay: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            reply_delay: Duration::from_millis(1500),
        }
    }
}

/// Query cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Cached data younger than this is served without refetching.
    pub stale_time: Duration,
    /// Entries are dropped from the cache after this long.
    pub gc_time: Duration,
    /// Additional attempts after a failed fetch.
    pub retry: u32,
    /// Delay between fetch attempts.
    pub retry_delay: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            gc_time: Duration::from_secs(300),
            retry: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Console application configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub run_mode: RunMode,
    pub api: ApiConfig,
    pub demo: DemoConfig,
    pub query: QueryConfig,
    /// Quantity below which a product counts as low stock.
    pub low_stock_threshold: u32,
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let hostname = vars.get_or_default("SUPPORT_DESK_HOSTNAME", DEFAULT_HOSTNAME);
        let run_mode = RunMode::detect(&hostname);

        let base_url = match vars.get("SUPPORT_DESK_API_URL") {
            Some(url) => parse_url("SUPPORT_DESK_API_URL", &url)?,
            None => default_api_url(run_mode, &hostname)?,
        };

        let api = ApiConfig {
            base_url,
            session_token: vars
                .get("SUPPORT_DESK_SESSION_TOKEN")
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            timeout: Duration::from_secs(vars.parse_or("SUPPORT_DESK_REQUEST_TIMEOUT_SECS", 30)?),
            retry: RetryPolicy::default(),
        };

        let demo = DemoConfig {
            enabled: vars.flag("SUPPORT_DESK_DEMO_MODE")?,
            data_dir: PathBuf::from(vars.get_or_default("SUPPORT_DESK_DATA_DIR", DEFAULT_DATA_DIR)),
            reply_delay: Duration::from_millis(vars.parse_or("SUPPORT_DESK_REPLY_DELAY_MS", 1500)?),
        };

        let query = QueryConfig {
            stale_time: Duration::from_secs(vars.parse_or("SUPPORT_DESK_STALE_SECS", 30)?),
            ..QueryConfig::default()
        };

        Ok(Self {
            run_mode,
            api,
            demo,
            query,
            low_stock_threshold: vars.parse_or("SUPPORT_DESK_LOW_STOCK", 5)?,
        })
    }

    /// Returns whether the demo store replaces the backend.
    #[must_use]
    pub const fn demo_mode(&self) -> bool {
        self.demo.enabled
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag; unset means false.
    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "0" | "false" | "no" | "off") => Ok(false),
            Some("1" | "true" | "yes" | "on") => Ok(true),
            Some(other) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn default_api_url(run_mode: RunMode, hostname: &str) -> Result<Url, ConfigError> {
    match run_mode {
        RunMode::Development => parse_url("SUPPORT_DESK_API_URL", DEVELOPMENT_API_URL),
        RunMode::Production => {
            parse_url("SUPPORT_DESK_HOSTNAME", &format!("https://{}/api", hostname.trim()))
        }
    }
}
