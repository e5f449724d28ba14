//! HTTP client for the meme generator backend

use crate::constants::*;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Everything the controller needs from the backend.
///
/// JSON endpoints report application failures in the body (`success: false`),
/// so implementations return the parsed body for any HTTP status and only
/// error on transport or decode problems.
#[async_trait]
pub trait MemeBackend: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResult, ApiError>;
    async fn caption(&self, req: &CaptionRequest) -> Result<CaptionResult, ApiError>;
    async fn templates(&self, limit: usize) -> Result<TemplateList, ApiError>;
    async fn health(&self) -> Result<HealthStatus, ApiError>;
    /// Raw bytes of an image. Unlike the JSON endpoints a non-2xx status is an error.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError>;
    /// Turn a server-relative URL like `/generated_memes/x.jpg` into an absolute one.
    fn resolve_url(&self, url: &str) -> String;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::Url {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("meme-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::Url {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = %status, len = bytes.len(), "API response received");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MemeBackend for ApiClient {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        let url = self.url(GENERATE_PATH)?;
        debug!(%url, topic = %req.topic, style = %req.style, "Requesting meme");
        let response = self.client.post(url).json(req).send().await?;
        Self::read_json(response).await
    }

    async fn caption(&self, req: &CaptionRequest) -> Result<CaptionResult, ApiError> {
        let url = self.url(CAPTION_PATH)?;
        debug!(%url, topic = %req.topic, "Requesting caption preview");
        let response = self.client.post(url).json(req).send().await?;
        Self::read_json(response).await
    }

    async fn templates(&self, limit: usize) -> Result<TemplateList, ApiError> {
        let url = self.url(TEMPLATES_PATH)?;
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.client.get(self.url(HEALTH_PATH)?).send().await?;
        Self::read_json(response).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(url)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn resolve_url(&self, url: &str) -> String {
        self.url(url)
            .map(String::from)
            .unwrap_or_else(|_| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:5000", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn relative_meme_urls_resolve_against_base() {
        assert_eq!(
            client().resolve_url("/generated_memes/meme_20240101_120000.jpg"),
            "http://127.0.0.1:5000/generated_memes/meme_20240101_120000.jpg"
        );
    }

    #[test]
    fn absolute_meme_urls_are_kept() {
        assert_eq!(
            client().resolve_url("https://i.imgflip.com/abc123.jpg"),
            "https://i.imgflip.com/abc123.jpg"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::new("not a url", Duration::from_secs(5))
            .err()
            .expect("base url should fail to parse");
        assert!(matches!(err, ApiError::Url { .. }));
    }

    #[test]
    fn endpoint_paths_join_onto_base() {
        let url = client().url(TEMPLATES_PATH).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/templates");
    }
}
