use std::fmt;

use url::Url;

pub const TOKEN_QUERY_PARAM: &str = "token";

const RELATIVE_BASE: &str = "http://localhost/";

/// Opaque membership token taken from the incoming address.
///
/// Validation is left to the webhook receiver; locally the value is only
/// carried through to the submission payload.
#[derive(Clone, PartialEq, Eq)]
pub struct MembershipToken(String);

impl MembershipToken {
    /// Wraps a token obtained some other way. Empty values are rejected.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MembershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MembershipToken")
            .field(&format_args!("<{} chars>", self.0.chars().count()))
            .finish()
    }
}

/// Returns the `token` query parameter of `address`, if any.
///
/// `address` may be an absolute URL, a path with a query, or a bare query
/// string (`?token=abc` or `token=abc`). An empty value counts as absent.
#[must_use]
pub fn extract_token(address: &str) -> Option<MembershipToken> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => {
            let relative = if trimmed.starts_with('?') || trimmed.starts_with('/') {
                trimmed.to_string()
            } else {
                format!("?{trimmed}")
            };
            Url::parse(RELATIVE_BASE).ok()?.join(&relative).ok()?
        }
    };

    parsed
        .query_pairs()
        .find(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .and_then(MembershipToken::new)
}
