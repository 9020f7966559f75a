use axum::http::HeaderValue;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use std::time::Duration;

use crate::service::sanitize_next;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_VERSION: &str = "v19.0";
pub const DEFAULT_SUCCESS_PATH: &str = "/settings";
pub const DEFAULT_FAILURE_PATH: &str = "/login?error=auth_failed";
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";

/// `GRAPH_REQUEST_TIMEOUT_SECS`, shared by every outbound call. Zero is rejected.
pub fn request_timeout_from_env() -> Result<Duration, ConfigError> {
    let secs: u64 = env_parse("GRAPH_REQUEST_TIMEOUT_SECS", 10)?;
    if secs == 0 {
        return Err(ConfigError::ParseError {
            key: "GRAPH_REQUEST_TIMEOUT_SECS".to_string(),
            details: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn redirect_path_from_env(key: &str, default: &str) -> Result<String, ConfigError> {
    let path = env_or_default(key, default);
    if sanitize_next(Some(&path), "").is_empty() {
        return Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a same-origin path", path),
        });
    }
    Ok(path)
}

/// Tuning for a linking run.
///
/// Environment variables:
/// - `GRAPH_REQUEST_TIMEOUT_SECS` (default 10)
/// - `LINK_PAGE_CONCURRENCY` (default 1, sequential)
/// - `LINK_SUCCESS_PATH` (default `/settings`)
/// - `LINK_FAILURE_PATH` (default `/login?error=auth_failed`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingConfig {
    pub request_timeout: Duration,
    pub page_concurrency: usize,
    pub success_path: String,
    pub failure_path: String,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            page_concurrency: 1,
            success_path: DEFAULT_SUCCESS_PATH.to_string(),
            failure_path: DEFAULT_FAILURE_PATH.to_string(),
        }
    }
}

impl FromEnv for LinkingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let page_concurrency: usize = env_parse("LINK_PAGE_CONCURRENCY", 1)?;

        Ok(Self {
            request_timeout: request_timeout_from_env()?,
            page_concurrency: page_concurrency.max(1),
            success_path: redirect_path_from_env("LINK_SUCCESS_PATH", DEFAULT_SUCCESS_PATH)?,
            failure_path: redirect_path_from_env("LINK_FAILURE_PATH", DEFAULT_FAILURE_PATH)?,
        })
    }
}

/// Social-graph endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    pub base_url: String,
    pub version: String,
    pub request_timeout: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            version: DEFAULT_GRAPH_VERSION.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl FromEnv for GraphConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_or_default("GRAPH_API_BASE_URL", DEFAULT_GRAPH_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            version: env_or_default("GRAPH_API_VERSION", DEFAULT_GRAPH_VERSION),
            request_timeout: request_timeout_from_env()?,
        })
    }
}

/// Hosted auth backend (GoTrue-compatible).
#[derive(Clone, PartialEq, Eq)]
pub struct HostedAuthConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout: Duration,
}

impl HostedAuthConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for HostedAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAuthConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl FromEnv for HostedAuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            env_required("HOSTED_AUTH_URL")?,
            env_required("HOSTED_AUTH_ANON_KEY")?,
        );
        config.request_timeout = request_timeout_from_env()?;
        Ok(config)
    }
}

/// Frontend origin that redirect paths are appended to, e.g. `https://app.example.com`.
///
/// Always an `http(s)` origin that is a valid header value, so any sanitised
/// path appended to it forms a valid `Location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrigin(String);

impl PublicOrigin {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let origin = value.trim().trim_end_matches('/');
        let invalid = |details: &str| ConfigError::ParseError {
            key: "PUBLIC_ORIGIN".to_string(),
            details: format!("'{}' {}", value, details),
        };

        let host = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"))
            .ok_or_else(|| invalid("must start with http:// or https://"))?;

        if host.is_empty() || host.contains(['/', '?', '#']) {
            return Err(invalid("must be a bare origin without path"));
        }
        if !origin.is_ascii() || HeaderValue::from_str(origin).is_err() {
            return Err(invalid("is not a valid header value"));
        }

        Ok(Self(origin.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromEnv for PublicOrigin {
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_or_default("PUBLIC_ORIGIN", DEFAULT_PUBLIC_ORIGIN))
    }
}
