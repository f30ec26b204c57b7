//! Client configuration
//!
//! Everything the client needs to reach the backend and the map provider,
//! plus how long persisted credentials stay valid.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default API base URL for local development
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";

/// Default places provider endpoint root
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com/maps/api/";

/// Access tokens live for one day
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Refresh tokens live for thirty days
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Email verification and password reset tokens live for one day
pub const ONE_TIME_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for REST calls. Always ends with `/` so relative paths join under it.
    pub api_base_url: Url,
    /// Real-time endpoint, derived from the API URL when not set
    pub realtime_url: Option<Url>,
    /// Root of the places/geocoding web API
    pub places_base_url: Url,
    /// API key for the places provider
    pub maps_api_key: Option<String>,
    /// Directory holding the credential database
    pub data_dir: PathBuf,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub one_time_token_ttl: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for the given API base URL and data directory.
    pub fn new(api_base_url: &str, data_dir: impl Into<PathBuf>) -> ClientResult<Self> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            realtime_url: None,
            places_base_url: parse_base_url(DEFAULT_PLACES_URL)?,
            maps_api_key: None,
            data_dir: data_dir.into(),
            access_token_ttl: ACCESS_TOKEN_TTL,
            refresh_token_ttl: REFRESH_TOKEN_TTL,
            one_time_token_ttl: ONE_TIME_TOKEN_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_maps_api_key(mut self, key: impl Into<String>) -> Self {
        self.maps_api_key = Some(key.into());
        self
    }

    /// Override the derived realtime endpoint (`ws`, `wss`, `http` or `https`)
    pub fn with_realtime_url(mut self, raw: &str) -> ClientResult<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ClientError::Config(format!("invalid URL '{}': {}", raw, e)))?;
        if !matches!(url.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported realtime scheme '{}' in '{}'",
                url.scheme(),
                raw
            )));
        }
        self.realtime_url = Some(url);
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Path of the credential database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("wayfarer.redb")
    }

    /// Resolve a resource path (`"posts/feed"`) against the API base URL
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("bad endpoint path '{}': {}", path, e)))
    }

    /// Real-time URL: explicit value, or the API origin with a ws/wss scheme
    pub fn realtime_endpoint(&self) -> ClientResult<Url> {
        if let Some(url) = &self.realtime_url {
            return Ok(url.clone());
        }
        let mut url = self.api_base_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Config("cannot derive realtime URL".into()))?;
        url.set_path("/socket.io/");
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let mut with_slash = raw.trim().to_string();
    if !with_slash.ends_with('/') {
        with_slash.push('/');
    }
    let url = Url::parse(&with_slash)
        .map_err(|e| ClientError::Config(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "unsupported URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}
