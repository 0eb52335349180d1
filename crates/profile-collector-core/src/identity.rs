use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const LOGIN_SCOPE: &str = "public_profile";
pub const PROFILE_FIELDS: &str = "id,name";
pub const CANONICAL_PROFILE_BASE_URL: &str = "https://www.facebook.com/";
pub const INVALID_PROFILE_URL_MESSAGE: &str =
    "Please enter a valid Facebook profile URL (e.g. https://www.facebook.com/yourname)";

// Case folding on the fixed prefix is ASCII-only.
static PROFILE_URL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(?-u:https?://(www\.)?facebook\.com/).+").ok());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileUrlError {
    #[error("profile url must not be empty")]
    Empty,
    #[error("profile url is not a facebook.com address")]
    NotFacebook,
}

impl ProfileUrlError {
    /// Text shown next to the input field.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Empty | Self::NotFacebook => INVALID_PROFILE_URL_MESSAGE,
        }
    }
}

/// A facebook.com profile address that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProfileUrl(String);

impl ProfileUrl {
    /// Trims `raw` and checks it against the accepted profile pattern.
    pub fn parse(raw: &str) -> Result<Self, ProfileUrlError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProfileUrlError::Empty);
        }
        let matches = PROFILE_URL_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(trimmed));
        if !matches {
            return Err(ProfileUrlError::NotFacebook);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Canonical profile address for a provider user id.
    pub fn for_user_id(user_id: &str) -> Result<Self, ProfileUrlError> {
        Self::parse(&format!("{CANONICAL_PROFILE_BASE_URL}{}", user_id.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of the provider's interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authorized { access_token: Option<String> },
    Cancelled,
}

/// Public fields returned by the provider's `/me` lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileFetchError {
    #[error("profile_fetch_not_authorized")]
    NotAuthorized,
    #[error("profile_fetch_failed:{message}")]
    Request { message: String },
    #[error("profile_fetch_http_{status}:{body}")]
    Http { status: u16, body: String },
    #[error("profile_fetch_provider_error:{message}")]
    Provider { message: String },
    #[error("profile_fetch_decode_failed:{message}")]
    Decode { message: String },
    #[error("profile_fetch_invalid_id:{id}")]
    InvalidId { id: String },
}

/// Delegated-login seam. Implementations wrap a browser SDK or a Graph API
/// client; both run on a single thread.
#[async_trait(?Send)]
pub trait IdentityProvider {
    async fn login(&self, scope: &str) -> LoginOutcome;
    async fn fetch_profile(&self) -> Result<ProviderProfile, ProfileFetchError>;

    /// Drops any authorization kept from an earlier attempt.
    fn forget_authorization(&self) {}
}
