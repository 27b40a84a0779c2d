//! Client configuration.
//!
//! Values come from the environment with a local-development fallback for the
//! API base. No request timeout is applied unless one is configured; the
//! connect timeout always is.

use std::path::PathBuf;
use std::time::Duration;

/// API base used when `API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
pub const API_TIMEOUT_ENV: &str = "API_TIMEOUT_SECS";
pub const SESSION_FILE_ENV: &str = "SESSION_FILE";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every operation path is appended to, e.g.
    /// `https://example.com/api`. Stored without a trailing slash.
    pub api_base_url: String,
    /// Overall per-request timeout. `None` leaves it to the HTTP stack.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Where the session (token, visitor id) is persisted. `None` keeps it in
    /// memory for the lifetime of the process.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session_file: None,
        }
    }

    /// Read `API_BASE_URL`, `API_TIMEOUT_SECS` and `SESSION_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as
    /// unset; an unparsable timeout is ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base = get(API_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::new(&base);

        if let Some(raw) = get(API_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => tracing::warn!(value = %raw, "ignoring invalid {API_TIMEOUT_ENV}"),
            }
        }
        config.session_file = get(SESSION_FILE_ENV).map(PathBuf::from);
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }
}
