//! Fetch collaborator — retrieves remote assets (logos) over HTTP.
//!
//! Handlers and the logo resolver only see the [`AssetFetcher`] trait; the
//! `reqwest`-backed [`HttpFetcher`] is wired in at startup.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

/// Media type assumed when a server omits `Content-Type`.
const DEFAULT_CONTENT_TYPE: &str = "image/svg+xml";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned status {0}")]
    Status(u16),
}

/// A fetched response, successful or not. Non-2xx responses are still returned
/// here so callers can report the status; see [`FetchedAsset::into_success`].
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FetchedAsset {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_success(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status(self.status))
        }
    }

    /// Declared media type without parameters, defaulting to SVG.
    pub fn media_type(&self) -> &str {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// `data:<media type>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), STANDARD.encode(&self.bytes))
    }
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, FetchError>;
}

/// `reqwest` implementation with a whole-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            timeout,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedAsset, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;

        Ok(FetchedAsset {
            status,
            content_type,
            bytes,
        })
    }
}

/// Coarse image family from a declared media type.
pub fn image_type(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("svg") {
        "SVG"
    } else if ct.contains("png") {
        "PNG"
    } else if ct.contains("jpeg") || ct.contains("jpg") {
        "JPEG"
    } else if ct.contains("gif") {
        "GIF"
    } else if ct.contains("webp") {
        "WebP"
    } else {
        "unknown"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn asset(status: u16, content_type: Option<&str>, body: &[u8]) -> FetchedAsset {
        FetchedAsset {
            status,
            content_type: content_type.map(str::to_string),
            bytes: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn test_data_uri_uses_declared_media_type() {
        let png = asset(200, Some("image/png"), b"\x89PNG");
        assert_eq!(png.to_data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_media_type_strips_parameters_and_defaults_to_svg() {
        let with_params = asset(200, Some("image/svg+xml; charset=utf-8"), b"<svg/>");
        assert_eq!(with_params.media_type(), "image/svg+xml");

        let missing = asset(200, None, b"<svg/>");
        assert_eq!(missing.media_type(), "image/svg+xml");
    }

    #[test]
    fn test_into_success_rejects_non_2xx() {
        assert!(asset(204, None, b"").into_success().is_ok());
        let err = asset(404, None, b"").into_success().unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[test]
    fn test_image_type_detection() {
        assert_eq!(image_type("image/svg+xml"), "SVG");
        assert_eq!(image_type("IMAGE/PNG"), "PNG");
        assert_eq!(image_type("image/jpg"), "JPEG");
        assert_eq!(image_type("image/gif"), "GIF");
        assert_eq!(image_type("image/webp"), "WebP");
        assert_eq!(image_type("application/octet-stream"), "unknown");
    }

    #[tokio::test]
    async fn test_http_fetcher_reports_connection_failure() {
        let fetcher = HttpFetcher::new(Duration::from_millis(500)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let result = fetcher.fetch("http://127.0.0.1:9/logo.svg").await;
        assert!(result.is_err());
    }
}
