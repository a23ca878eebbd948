//! Client configuration for the portal API and the local session file.
//! Values are public; the session token never lives here.
//!
//! Every endpoint path can be overridden because verifier deployments disagree
//! on where the ceremony routes are mounted.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3080/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("unsupported API URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Paths of the auth endpoints, relative to the API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub options: String,
    pub register_options: String,
    pub login_options: String,
    pub register: String,
    pub login: String,
    pub verify_email: String,
    pub logout: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            options: "/auth/webauthn/options".to_string(),
            register_options: "/auth/register/start".to_string(),
            login_options: "/auth/login/start".to_string(),
            register: "/auth/webauthn/register".to_string(),
            login: "/auth/webauthn/login".to_string(),
            verify_email: "/auth/verify-email".to_string(),
            logout: "/auth/logout".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub api_base_url: String,
    pub endpoints: Endpoints,
    pub timeout: Duration,
}

impl AuthConfig {
    /// Builds a config for `api_base_url` with default endpoints and timeout.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or is not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = api_base_url.trim();
        let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
        }

        Ok(Self {
            api_base_url: trimmed.trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// # Errors
    /// Returns an error for a zero timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Default location of the persisted session: `<config dir>/paios/session.json`.
#[must_use]
pub fn default_session_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("paios").join("session.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let config = AuthConfig::new(" https://portal.local/api/v1/ ").unwrap();
        assert_eq!(config.api_base_url, "https://portal.local/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn new_rejects_bad_urls() {
        assert!(matches!(
            AuthConfig::new("not a url"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert_eq!(
            AuthConfig::new("ftp://portal.local").unwrap_err(),
            ConfigError::UnsupportedScheme("ftp".to_string())
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = AuthConfig::default();
        assert_eq!(
            config.with_timeout(Duration::ZERO).unwrap_err(),
            ConfigError::ZeroTimeout
        );
    }

    #[test]
    fn default_session_file_is_under_paios() {
        if let Some(path) = default_session_file() {
            assert!(path.ends_with("paios/session.json"));
        }
    }
}
