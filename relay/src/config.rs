use std::time::Duration;

use anyhow::Context;

use crate::proxy::auth::UpstreamAuth;
use crate::proxy::retry::RetryPolicy;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "postgres://127.0.0.1:5432/movieapp";
const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_TMDB_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub tmdb: TmdbConfig,
}

/// Everything the upstream proxy needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: url::Url,
    /// `None` when neither `TMDB_ACCESS_TOKEN` nor `TMDB_KEY` is set.
    pub auth: Option<UpstreamAuth>,
    /// Bound on a single attempt, not on the whole retry sequence.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl TmdbConfig {
    pub fn new(base_url: &str, auth: Option<UpstreamAuth>) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            auth,
            timeout: Duration::from_secs(DEFAULT_TMDB_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        })
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let auth = UpstreamAuth::from_credentials(
        std::env::var("TMDB_ACCESS_TOKEN").ok(),
        std::env::var("TMDB_KEY").ok(),
    );

    let base_url = std::env::var("TMDB_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_TMDB_BASE_URL.into());

    let mut retry = RetryPolicy::default();
    if let Some(max) = std::env::var("TMDB_MAX_RETRIES")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        retry.max_retries = max;
    }

    Ok(Config {
        port: std::env::var("RELAY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
        tmdb: TmdbConfig {
            base_url: parse_base_url(&base_url)?,
            auth,
            timeout: Duration::from_secs(
                std::env::var("TMDB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TMDB_TIMEOUT_SECS),
            ),
            retry,
        },
    })
}

/// Parses the upstream base URL and strips any trailing slash so that
/// endpoint paths can be appended verbatim.
fn parse_base_url(raw: &str) -> anyhow::Result<url::Url> {
    let url = url::Url::parse(raw.trim_end_matches('/'))
        .with_context(|| format!("invalid upstream base URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("upstream base URL must be http or https, got '{}'", url.scheme());
    }
    Ok(url)
}
