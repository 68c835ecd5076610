//! Credential injection for outbound TMDB calls.

use std::fmt;

use reqwest::RequestBuilder;

/// Query parameter carrying the v3 API key.
pub const API_KEY_PARAM: &str = "api_key";

/// How outbound requests authenticate. Selected once at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum UpstreamAuth {
    /// v4 read access token, sent as `Authorization: Bearer <token>`.
    Bearer(String),
    /// v3 API key, sent as the `api_key` query parameter.
    ApiKey(String),
}

impl UpstreamAuth {
    /// Picks the strategy from the two optional credentials. The bearer
    /// token wins when both are present; blank values count as unset.
    pub fn from_credentials(token: Option<String>, api_key: Option<String>) -> Option<Self> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (non_blank(token), non_blank(api_key)) {
            (Some(token), _) => Some(Self::Bearer(token)),
            (None, Some(key)) => Some(Self::ApiKey(key)),
            (None, None) => None,
        }
    }

    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Bearer(token) => builder.bearer_auth(token),
            Self::ApiKey(key) => builder.query(&[(API_KEY_PARAM, key)]),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "access token",
            Self::ApiKey(_) => "api key",
        }
    }
}

// Secrets never reach the logs.
impl fmt::Debug for UpstreamAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (variant, secret) = match self {
            Self::Bearer(s) => ("Bearer", s),
            Self::ApiKey(s) => ("ApiKey", s),
        };
        let chars: Vec<char> = secret.chars().collect();
        let masked = if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}…{tail}")
        } else {
            "****".to_string()
        };
        f.debug_tuple(variant).field(&masked).finish()
    }
}
