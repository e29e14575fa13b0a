//! Music-service client
//!
//! The sync adapter only needs two calls from a streaming service: exchange an
//! OAuth authorization code for an access token, and fetch the user's top
//! artists as raw JSON. The payload is handed to the sync adapter untouched;
//! its shape is service-defined.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tastematch_common::config::SpotifyConfig;
use thiserror::Error;

/// OAuth scope needed to read top artists
pub const TOP_READ_SCOPE: &str = "user-top-read";

/// Music-service client errors
#[derive(Debug, Error)]
pub enum MusicClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Music service not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for MusicClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MusicClientError::Timeout
        } else if err.is_decode() {
            MusicClientError::ParseError(err.to_string())
        } else {
            MusicClientError::NetworkError(err.to_string())
        }
    }
}

/// Token returned by the authorization-code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A streaming service able to report a user's top artists
#[async_trait]
pub trait MusicServiceClient: Send + Sync {
    /// Service identifier stored on synced profiles (e.g. "spotify")
    fn service_name(&self) -> &'static str;

    /// URL the user is redirected to for consent
    fn authorize_url(&self) -> Result<String, MusicClientError>;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, MusicClientError>;

    /// Raw top-artists payload for the token's owner
    async fn top_artists(&self, access_token: &str, limit: u32) -> Result<Value, MusicClientError>;
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self, MusicClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MusicClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn require_credentials(&self) -> Result<(), MusicClientError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(MusicClientError::NotConfigured(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MusicClientError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MusicClientError::ApiError(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl MusicServiceClient for SpotifyClient {
    fn service_name(&self) -> &'static str {
        "spotify"
    }

    fn authorize_url(&self) -> Result<String, MusicClientError> {
        if self.config.client_id.is_empty() {
            return Err(MusicClientError::NotConfigured(
                "SPOTIFY_CLIENT_ID must be set".to_string(),
            ));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/authorize", self.config.accounts_base_url),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", TOP_READ_SCOPE),
            ],
        )
        .map_err(|e| MusicClientError::NotConfigured(format!("Invalid accounts URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, MusicClientError> {
        self.require_credentials()?;

        let url = format!("{}/api/token", self.config.accounts_base_url);
        tracing::debug!(url = %url, "Exchanging Spotify authorization code");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<OAuthToken>().await?)
    }

    async fn top_artists(&self, access_token: &str, limit: u32) -> Result<Value, MusicClientError> {
        let url = format!("{}/me/top/artists", self.config.api_base_url);
        tracing::debug!(url = %url, limit, "Querying Spotify top artists");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}
