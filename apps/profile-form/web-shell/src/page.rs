use profile_collector_core::config::{
    ENV_DEBUG, ENV_FB_API_VERSION, ENV_FB_APP_ID, ENV_GROUP_URL, ENV_WEBHOOK_URL,
};
use profile_collector_core::view_state::VIEW_REGION_IDS;
use profile_collector_core::{CollectorConfig, ConfigError, ProfileFetchError, ProviderProfile, ViewState};
use serde::Deserialize;
use thiserror::Error;

pub const FB_LOGIN_BUTTON_ID: &str = "btn-fb-login";
pub const MANUAL_SUBMIT_BUTTON_ID: &str = "btn-manual-submit";
pub const RETRY_BUTTON_ID: &str = "btn-retry";
pub const MANUAL_INPUT_ID: &str = "manual-fb-url";
pub const ERROR_MESSAGE_ID: &str = "error-message";
pub const GROUP_LINK_ID: &str = "group-link";
pub const CONFIG_GLOBAL: &str = "PROFILE_COLLECTOR_CONFIG";

/// Page-level overrides read from `window.PROFILE_COLLECTOR_CONFIG`. The
/// upper-case keys of the older `CONFIG` object are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
pub struct PageConfigOverride {
    #[serde(default, alias = "FB_APP_ID")]
    pub fb_app_id: Option<String>,
    #[serde(default, alias = "FB_API_VERSION")]
    pub fb_api_version: Option<String>,
    #[serde(default, alias = "N8N_WEBHOOK_URL")]
    pub webhook_url: Option<String>,
    #[serde(default, alias = "FB_GROUP_URL")]
    pub group_url: Option<String>,
    #[serde(default, alias = "DEBUG")]
    pub debug: Option<bool>,
}

impl PageConfigOverride {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            ENV_FB_APP_ID => self.fb_app_id.clone(),
            ENV_FB_API_VERSION => self.fb_api_version.clone(),
            ENV_WEBHOOK_URL => self.webhook_url.clone(),
            ENV_GROUP_URL => self.group_url.clone(),
            ENV_DEBUG => self.debug.map(|debug| debug.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PageConfigError {
    #[error("page config is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Resolves the page configuration from the JSON form of the override
/// object, or the built-in defaults when there is none.
pub fn resolve_page_config(override_json: Option<&str>) -> Result<CollectorConfig, PageConfigError> {
    let overrides = match override_json.map(str::trim) {
        None | Some("" | "null" | "undefined") => PageConfigOverride::default(),
        Some(json) => serde_json::from_str::<PageConfigOverride>(json)?,
    };
    Ok(CollectorConfig::from_lookup(|key| overrides.lookup(key))?)
}

/// `display` value for every view region when `view` is visible.
#[must_use]
pub fn region_display(view: &ViewState) -> [(&'static str, &'static str); 6] {
    let visible = view.region_id();
    VIEW_REGION_IDS.map(|id| (id, if id == visible { "block" } else { "none" }))
}

#[derive(Debug, Deserialize)]
struct SdkErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SdkMeResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<SdkErrorBody>,
}

/// Interprets the JSON form of an `FB.api('/me')` callback argument.
pub fn profile_from_sdk_json(json: Option<&str>) -> Result<ProviderProfile, ProfileFetchError> {
    let json = match json.map(str::trim) {
        None | Some("" | "null" | "undefined") => {
            return Err(ProfileFetchError::Provider {
                message: "empty profile response".to_string(),
            });
        }
        Some(json) => json,
    };
    let response =
        serde_json::from_str::<SdkMeResponse>(json).map_err(|error| ProfileFetchError::Decode {
            message: error.to_string(),
        })?;
    if let Some(error) = response.error {
        return Err(ProfileFetchError::Provider {
            message: error
                .message
                .unwrap_or_else(|| "unknown sdk error".to_string()),
        });
    }
    let id = response
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProfileFetchError::Decode {
            message: "profile response is missing id".to_string(),
        })?;
    Ok(ProviderProfile {
        id,
        name: response.name,
    })
}
