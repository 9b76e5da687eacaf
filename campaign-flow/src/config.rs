use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const API_URL_VAR: &str = "CAMPAIGN_API_URL";
pub const API_TOKEN_VAR: &str = "CAMPAIGN_API_TOKEN";
pub const API_TIMEOUT_VAR: &str = "CAMPAIGN_API_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Where the campaign backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url.as_ref())?,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_VAR).ok_or(ConfigError::Missing(API_URL_VAR))?;
        let mut config = Self::new(base_url)?;

        config.token = lookup(API_TOKEN_VAR).filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup(API_TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    var: API_TIMEOUT_VAR,
                    reason: e.to_string(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Append `path` segments to the base URL, keeping any path prefix the base carries.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        // base URLs are checked to have a path at construction
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: API_URL_VAR,
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(format!("'{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("expected an http(s) URL, got '{}'", raw)));
    }
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("'{}' has no host", raw)));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(format!("'{}' must not carry a query or fragment", raw)));
    }
    Ok(url)
}
