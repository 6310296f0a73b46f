//! Remote backup configuration.
//!
//! Lanyard backs up to a Supabase project: `GoTrue` for identity and `PostgREST`
//! for the tables. Both are addressed from the project URL plus the public anon
//! key. Secret credentials never live here.

use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

/// Default per-request timeout for remote calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Supabase URL and anon key must be configured together")]
    Incomplete,
}

/// Validated Supabase project settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    project_url: String,
    anon_key: String,
    request_timeout: Duration,
}

impl RemoteConfig {
    pub fn new(url: impl AsRef<str>, anon_key: impl AsRef<str>) -> Result<Self, ConfigError> {
        let project_url = normalize_project_url(url.as_ref())?;
        let anon_key = anon_key.as_ref().trim().to_string();
        if anon_key.is_empty() {
            return Err(ConfigError::Invalid(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            project_url,
            anon_key,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Build from optional values; `None` when neither is set.
    ///
    /// Setting only one of the two is a configuration error.
    pub fn from_optional(
        url: Option<String>,
        anon_key: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (normalize_text_option(url), normalize_text_option(anon_key)) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => Self::new(url, anon_key).map(Some),
            _ => Err(ConfigError::Incomplete),
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Project URL without a trailing slash
    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `GoTrue` base URL
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.project_url)
    }

    /// `PostgREST` base URL
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.project_url)
    }
}

/// Accepts a bare project URL or one that already ends in a service path.
fn normalize_project_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(ConfigError::Invalid(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }

    let base = trimmed
        .strip_suffix("/auth/v1")
        .or_else(|| trimmed.strip_suffix("/rest/v1"))
        .unwrap_or(trimmed);
    Ok(base.to_string())
}
