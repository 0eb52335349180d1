use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identity::{ProfileFetchError, ProfileUrl, ProviderProfile};
use crate::token::MembershipToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    #[serde(rename = "oauth")]
    OAuth,
    Manual,
}

impl IdentitySource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OAuth => "oauth",
            Self::Manual => "manual",
        }
    }
}

/// One submission attempt. Built through [`ProfileSubmission::manual`] or
/// [`ProfileSubmission::oauth`] so the provider fields only exist for OAuth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSubmission {
    token: MembershipToken,
    source: IdentitySource,
    external_user_id: Option<String>,
    display_name: Option<String>,
    profile_url: ProfileUrl,
}

impl ProfileSubmission {
    #[must_use]
    pub fn manual(token: MembershipToken, profile_url: ProfileUrl) -> Self {
        Self {
            token,
            source: IdentitySource::Manual,
            external_user_id: None,
            display_name: None,
            profile_url,
        }
    }

    pub fn oauth(
        token: MembershipToken,
        profile: ProviderProfile,
    ) -> Result<Self, ProfileFetchError> {
        let id = profile.id.trim().to_string();
        let profile_url = ProfileUrl::for_user_id(&id)
            .map_err(|_| ProfileFetchError::InvalidId { id: id.clone() })?;
        Ok(Self {
            token,
            source: IdentitySource::OAuth,
            external_user_id: Some(id),
            display_name: profile.name,
            profile_url,
        })
    }

    #[must_use]
    pub fn source(&self) -> IdentitySource {
        self.source
    }

    #[must_use]
    pub fn token(&self) -> &MembershipToken {
        &self.token
    }

    #[must_use]
    pub fn external_user_id(&self) -> Option<&str> {
        self.external_user_id.as_deref()
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn profile_url(&self) -> &ProfileUrl {
        &self.profile_url
    }

    #[must_use]
    pub fn to_payload(&self) -> WebhookPayload {
        WebhookPayload {
            token: self.token.as_str().to_string(),
            fb_user_id: self.external_user_id.clone(),
            fb_name: self.display_name.clone(),
            fb_profile_url: self.profile_url.as_str().to_string(),
            method: self.source,
        }
    }
}

/// JSON body posted to the webhook. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub token: String,
    pub fb_user_id: Option<String>,
    pub fb_name: Option<String>,
    pub fb_profile_url: String,
    pub method: IdentitySource,
}

impl WebhookPayload {
    pub fn to_json(&self) -> Result<String, SubmissionError> {
        serde_json::to_string(self).map_err(|error| SubmissionError::Encode {
            message: error.to_string(),
        })
    }
}

/// Why a submission did not reach a 2xx response. Diagnostic only; the
/// member always sees the generic failure text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("webhook_payload_encode_failed:{message}")]
    Encode { message: String },
    #[error("webhook_request_failed:{message}")]
    Transport { message: String },
    #[error("webhook_http_{status}:{body}")]
    Http { status: u16, body: String },
}

impl SubmissionError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Encode { .. } | Self::Transport { .. } => None,
        }
    }
}

/// Renders a failed response body for the diagnostic log.
#[must_use]
pub fn diagnostic_body(body: Option<&[u8]>) -> String {
    body.map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "<empty>".to_string())
}

/// The single network seam. One call per submission attempt, no retries.
#[async_trait(?Send)]
pub trait WebhookTransport {
    async fn post_profile(&self, payload: &WebhookPayload) -> Result<(), SubmissionError>;
}
