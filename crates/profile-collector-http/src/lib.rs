//! Native HTTP transports for the profile collector.

pub mod graph;
pub mod webhook;

use profile_collector_core::ConfigError;
use thiserror::Error;

pub use graph::{
    AccessTokenSource, DEFAULT_GRAPH_BASE_URL, GraphIdentityProvider, GraphProfileClient,
    StaticAccessToken,
};
pub use webhook::WebhookClient;

pub const USER_AGENT: &str = concat!("profile-collector/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error(transparent)]
    InvalidEndpoint(#[from] ConfigError),
    #[error("http client build failed: {message}")]
    Build { message: String },
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, HttpClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|error| HttpClientError::Build {
            message: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_share_the_config_url_rules() {
        let client = WebhookClient::new(" HTTPS://hooks.example.com/collect/ ").expect("client");
        assert_eq!(client.endpoint(), "HTTPS://hooks.example.com/collect");

        for raw in ["", "hooks.example.com", "ftp://hooks.example.com", "https://"] {
            assert!(
                matches!(
                    WebhookClient::new(raw),
                    Err(HttpClientError::InvalidEndpoint(_))
                ),
                "{raw} should be rejected"
            );
        }
    }
}
