use std::env;

use thiserror::Error;

pub const DEFAULT_FB_APP_ID: &str = "25699988686294647";
pub const DEFAULT_FB_API_VERSION: &str = "v22.0";
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.srv1047489.hstgr.cloud/webhook-test/fb-profile-collector";
pub const DEFAULT_GROUP_URL: &str = "https://www.facebook.com/groups/cvmamn";
pub const DEFAULT_DEBUG: bool = false;

pub const ENV_FB_APP_ID: &str = "PROFILE_COLLECTOR_FB_APP_ID";
pub const ENV_FB_API_VERSION: &str = "PROFILE_COLLECTOR_FB_API_VERSION";
pub const ENV_WEBHOOK_URL: &str = "PROFILE_COLLECTOR_WEBHOOK_URL";
pub const ENV_GROUP_URL: &str = "PROFILE_COLLECTOR_GROUP_URL";
pub const ENV_DEBUG: &str = "PROFILE_COLLECTOR_DEBUG";

/// Public client configuration. None of these values are secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub fb_app_id: String,
    pub fb_api_version: String,
    pub webhook_url: String,
    pub group_url: String,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
    #[error("invalid {key} value '{value}': must use http:// or https:// and include a host")]
    InvalidUrl { key: &'static str, value: String },
    #[error("invalid {key} value '{value}': expected a boolean")]
    InvalidBool { key: &'static str, value: String },
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fb_app_id: DEFAULT_FB_APP_ID.to_string(),
            fb_api_version: DEFAULT_FB_API_VERSION.to_string(),
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            group_url: DEFAULT_GROUP_URL.to_string(),
            debug: DEFAULT_DEBUG,
        }
    }
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        let fb_app_id = value(ENV_FB_APP_ID).unwrap_or(defaults.fb_app_id);
        let fb_api_version = value(ENV_FB_API_VERSION).unwrap_or(defaults.fb_api_version);
        let webhook_url = normalize_http_url(
            ENV_WEBHOOK_URL,
            &value(ENV_WEBHOOK_URL).unwrap_or(defaults.webhook_url),
        )?;
        let group_url = normalize_http_url(
            ENV_GROUP_URL,
            &value(ENV_GROUP_URL).unwrap_or(defaults.group_url),
        )?;
        let debug = match value(ENV_DEBUG) {
            Some(raw) => parse_bool(ENV_DEBUG, &raw)?,
            None => defaults.debug,
        };

        Ok(Self {
            fb_app_id,
            fb_api_version,
            webhook_url,
            group_url,
            debug,
        })
    }

    /// Default log filter for binaries that do not set `RUST_LOG`.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

/// Trims whitespace and trailing slashes; the scheme must be http or https
/// (any case) and a host must follow.
pub fn normalize_http_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { key });
    }
    let invalid = || ConfigError::InvalidUrl {
        key,
        value: trimmed.to_string(),
    };
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(invalid());
    };
    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        return Err(invalid());
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: raw.to_string(),
        }),
    }
}
