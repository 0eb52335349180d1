use async_trait::async_trait;
use profile_collector_core::config::normalize_http_url;
use profile_collector_core::submission::diagnostic_body;
use profile_collector_core::{SubmissionError, WebhookPayload, WebhookTransport};
use tracing::debug;

use crate::{HttpClientError, build_http_client};

const WEBHOOK_URL_KEY: &str = "webhook url";

/// Posts profile records to the collection webhook.
///
/// One request per call. Any 2xx is success and the body is not read; other
/// statuses are read best-effort for diagnostics.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    endpoint: String,
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new(endpoint: &str) -> Result<Self, HttpClientError> {
        Ok(Self::with_client(
            normalize_http_url(WEBHOOK_URL_KEY, endpoint)?,
            build_http_client()?,
        ))
    }

    #[must_use]
    pub fn with_client(endpoint: String, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl WebhookTransport for WebhookClient {
    async fn post_profile(&self, payload: &WebhookPayload) -> Result<(), SubmissionError> {
        let response = self
            .http
            .post(self.endpoint.as_str())
            .json(payload)
            .send()
            .await
            .map_err(|error| SubmissionError::Transport {
                message: error.without_url().to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "webhook accepted profile");
            return Ok(());
        }

        let body = response.bytes().await.ok();
        Err(SubmissionError::Http {
            status: status.as_u16(),
            body: diagnostic_body(body.as_deref()),
        })
    }
}
