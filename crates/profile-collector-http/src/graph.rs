use std::cell::RefCell;

use async_trait::async_trait;
use profile_collector_core::config::normalize_http_url;
use profile_collector_core::identity::PROFILE_FIELDS;
use profile_collector_core::submission::diagnostic_body;
use profile_collector_core::{IdentityProvider, LoginOutcome, ProfileFetchError, ProviderProfile};
use serde::Deserialize;
use tracing::debug;

use crate::{HttpClientError, build_http_client};

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const GRAPH_BASE_URL_KEY: &str = "graph base url";

#[derive(Debug, Deserialize)]
struct GraphMeResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<GraphErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// Looks up the public `id,name` of the user behind an access token.
#[derive(Debug, Clone)]
pub struct GraphProfileClient {
    base_url: String,
    api_version: String,
    http: reqwest::Client,
}

impl GraphProfileClient {
    pub fn new(api_version: &str) -> Result<Self, HttpClientError> {
        Self::with_base_url(DEFAULT_GRAPH_BASE_URL, api_version)
    }

    pub fn with_base_url(base_url: &str, api_version: &str) -> Result<Self, HttpClientError> {
        Ok(Self {
            base_url: normalize_http_url(GRAPH_BASE_URL_KEY, base_url)?,
            api_version: api_version.trim().trim_matches('/').to_string(),
            http: build_http_client()?,
        })
    }

    #[must_use]
    pub fn me_url(&self) -> String {
        if self.api_version.is_empty() {
            format!("{}/me", self.base_url)
        } else {
            format!("{}/{}/me", self.base_url, self.api_version)
        }
    }

    pub async fn fetch_me(&self, access_token: &str) -> Result<ProviderProfile, ProfileFetchError> {
        let response = self
            .http
            .get(self.me_url())
            .query(&[("fields", PROFILE_FIELDS), ("access_token", access_token)])
            .send()
            .await
            .map_err(|error| ProfileFetchError::Request {
                message: error.without_url().to_string(),
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ProfileFetchError::Request {
                message: error.without_url().to_string(),
            })?;

        let parsed = serde_json::from_slice::<GraphMeResponse>(&bytes);
        if let Ok(GraphMeResponse {
            error: Some(error), ..
        }) = &parsed
        {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| "unknown graph error".to_string());
            return Err(ProfileFetchError::Provider {
                message: match error.code {
                    Some(code) => format!("({code}) {message}"),
                    None => message,
                },
            });
        }

        if !status.is_success() {
            return Err(ProfileFetchError::Http {
                status: status.as_u16(),
                body: diagnostic_body(Some(&bytes)),
            });
        }

        let parsed = parsed.map_err(|error| ProfileFetchError::Decode {
            message: error.to_string(),
        })?;
        let id = parsed
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProfileFetchError::Decode {
                message: "profile response is missing id".to_string(),
            })?;

        Ok(ProviderProfile {
            id,
            name: parsed.name,
        })
    }
}

/// Supplies the access token produced by the provider's consent flow.
/// `None` means the member backed out.
#[async_trait(?Send)]
pub trait AccessTokenSource {
    async fn access_token(&self, scope: &str) -> Option<String>;
}

/// Token already obtained elsewhere, e.g. from a command-line flag.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessToken(pub Option<String>);

#[async_trait(?Send)]
impl AccessTokenSource for StaticAccessToken {
    async fn access_token(&self, _scope: &str) -> Option<String> {
        self.0.clone()
    }
}

/// Delegated login backed by the Graph API.
pub struct GraphIdentityProvider<S> {
    client: GraphProfileClient,
    source: S,
    authorization: RefCell<Option<String>>,
}

impl<S: AccessTokenSource> GraphIdentityProvider<S> {
    pub fn new(client: GraphProfileClient, source: S) -> Self {
        Self {
            client,
            source,
            authorization: RefCell::new(None),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization.borrow().is_some()
    }
}

#[async_trait(?Send)]
impl<S: AccessTokenSource> IdentityProvider for GraphIdentityProvider<S> {
    async fn login(&self, scope: &str) -> LoginOutcome {
        let token = self
            .source
            .access_token(scope)
            .await
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                self.authorization.replace(Some(token.clone()));
                LoginOutcome::Authorized {
                    access_token: Some(token),
                }
            }
            None => {
                debug!(scope, "no access token supplied");
                LoginOutcome::Cancelled
            }
        }
    }

    async fn fetch_profile(&self) -> Result<ProviderProfile, ProfileFetchError> {
        let token = self
            .authorization
            .borrow()
            .clone()
            .ok_or(ProfileFetchError::NotAuthorized)?;
        self.client.fetch_me(&token).await
    }

    fn forget_authorization(&self) {
        self.authorization.replace(None);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;

    use anyhow::Result;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use profile_collector_core::identity::LOGIN_SCOPE;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    async fn graph_me(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        if params.get("fields").map(String::as_str) != Some("id,name") {
            return (StatusCode::BAD_REQUEST, "missing fields".to_string());
        }
        let body = match params.get("access_token").map(String::as_str) {
            Some("good") => r#"{"id":"10001","name":"Jane Doe"}"#,
            Some("anonymous") => r#"{"id":"10002"}"#,
            Some("no-id") => r#"{"name":"Nobody"}"#,
            Some("expired") => {
                return (
                    StatusCode::BAD_REQUEST,
                    r#"{"error":{"message":"Session has expired","type":"OAuthException","code":190}}"#
                        .to_string(),
                );
            }
            Some("broken") => return (StatusCode::BAD_GATEWAY, "upstream down".to_string()),
            _ => r#"{"error":{"message":"Invalid OAuth access token."}}"#,
        };
        (StatusCode::OK, body.to_string())
    }

    async fn start_graph_stub() -> Result<(SocketAddr, JoinHandle<()>)> {
        let app = Router::new().route("/v22.0/me", get(graph_me));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("graph stub server failed");
        });
        Ok((addr, handle))
    }

    fn client(addr: SocketAddr) -> GraphProfileClient {
        GraphProfileClient::with_base_url(&format!("http://{addr}"), "v22.0").expect("client")
    }

    #[test]
    fn me_url_includes_api_version() {
        let client = GraphProfileClient::new("v22.0").expect("client");
        assert_eq!(client.me_url(), "https://graph.facebook.com/v22.0/me");
    }

    #[tokio::test]
    async fn fetch_me_returns_id_and_name() -> Result<()> {
        let (addr, handle) = start_graph_stub().await?;

        let profile = client(addr).fetch_me("good").await?;
        assert_eq!(
            profile,
            ProviderProfile {
                id: "10001".to_string(),
                name: Some("Jane Doe".to_string()),
            }
        );

        let anonymous = client(addr).fetch_me("anonymous").await?;
        assert_eq!(anonymous.name, None);
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn error_payload_is_a_provider_error() -> Result<()> {
        let (addr, handle) = start_graph_stub().await?;

        let expired = client(addr).fetch_me("expired").await;
        assert_eq!(
            expired,
            Err(ProfileFetchError::Provider {
                message: "(190) Session has expired".to_string(),
            })
        );

        let invalid = client(addr).fetch_me("unknown").await;
        assert!(matches!(invalid, Err(ProfileFetchError::Provider { .. })));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn non_json_failure_is_an_http_error() -> Result<()> {
        let (addr, handle) = start_graph_stub().await?;

        let error = client(addr).fetch_me("broken").await;
        assert_eq!(
            error,
            Err(ProfileFetchError::Http {
                status: 502,
                body: "upstream down".to_string(),
            })
        );
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn missing_id_is_a_decode_error() -> Result<()> {
        let (addr, handle) = start_graph_stub().await?;

        let error = client(addr).fetch_me("no-id").await;
        assert!(matches!(error, Err(ProfileFetchError::Decode { .. })));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn provider_login_and_fetch() -> Result<()> {
        let (addr, handle) = start_graph_stub().await?;
        let provider =
            GraphIdentityProvider::new(client(addr), StaticAccessToken(Some(" good ".to_string())));

        assert_eq!(
            provider.fetch_profile().await,
            Err(ProfileFetchError::NotAuthorized)
        );
        assert_eq!(
            provider.login(LOGIN_SCOPE).await,
            LoginOutcome::Authorized {
                access_token: Some("good".to_string()),
            }
        );
        assert_eq!(provider.fetch_profile().await?.id, "10001");

        provider.forget_authorization();
        assert!(!provider.is_authorized());
        assert_eq!(
            provider.fetch_profile().await,
            Err(ProfileFetchError::NotAuthorized)
        );
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn blank_token_cancels_login() {
        let provider = GraphIdentityProvider::new(
            GraphProfileClient::new("v22.0").expect("client"),
            StaticAccessToken(Some("   ".to_string())),
        );
        assert_eq!(provider.login(LOGIN_SCOPE).await, LoginOutcome::Cancelled);
        assert!(!provider.is_authorized());
    }
}
