use async_trait::async_trait;
use gloo_net::http::Request;
use profile_collector_core::submission::diagnostic_body;
use profile_collector_core::{SubmissionError, WebhookPayload, WebhookTransport};

use super::debug_error;

/// Browser `fetch` transport for the collection webhook.
pub(super) struct FetchWebhookTransport {
    endpoint: String,
}

impl FetchWebhookTransport {
    pub(super) fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl WebhookTransport for FetchWebhookTransport {
    async fn post_profile(&self, payload: &WebhookPayload) -> Result<(), SubmissionError> {
        let body = payload.to_json()?;
        let result = async {
            let response = Request::post(&self.endpoint)
                .header("content-type", "application/json")
                .body(body)
                .map_err(|error| SubmissionError::Transport {
                    message: format!("failed to build request: {error}"),
                })?
                .send()
                .await
                .map_err(|error| SubmissionError::Transport {
                    message: error.to_string(),
                })?;

            if response.ok() {
                return Ok(());
            }
            let status = response.status();
            let body = response.binary().await.ok();
            Err(SubmissionError::Http {
                status,
                body: diagnostic_body(body.as_deref()),
            })
        }
        .await;

        if let Err(error) = &result {
            debug_error(&format!("Submission error: {error}"));
        }
        result
    }
}
