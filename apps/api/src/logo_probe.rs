//! Logo probe — checks whether a logo address can be fetched and embedded,
//! without rendering anything.

use axum::{extract::State, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::fetch::{image_type, AssetFetcher};
use crate::state::AppState;

const DATA_URI_PREFIX_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProbeResponse {
    pub success: bool,
    pub logo_url: String,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub image_type: Option<&'static str>,
    pub size: usize,
    pub data_uri_prefix: Option<String>,
    pub error: Option<String>,
}

/// POST /api/v1/logo/probe
///
/// Body: `{"logo_url": "..."}`. Always answers 200 for a well-formed request;
/// `success` reports whether the logo could be embedded.
pub async fn handle_logo_probe(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProbeResponse>, AppError> {
    let request: ProbeRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("expected {{\"logo_url\": ...}}: {e}")))?;

    let logo_url = request
        .logo_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("logo_url is required".to_string()))?;

    Ok(Json(probe(&logo_url, state.fetcher.as_ref()).await))
}

pub async fn probe(logo_url: &str, fetcher: &dyn AssetFetcher) -> ProbeResponse {
    let mut response = ProbeResponse {
        success: false,
        logo_url: logo_url.to_string(),
        status: None,
        content_type: None,
        image_type: None,
        size: 0,
        data_uri_prefix: None,
        error: None,
    };

    match fetcher.fetch(logo_url).await {
        Ok(asset) => {
            response.status = Some(asset.status);
            response.content_type = asset.content_type.clone();
            response.size = asset.bytes.len();

            if asset.is_success() {
                let data_uri = asset.to_data_uri();
                response.success = true;
                response.image_type = Some(image_type(asset.media_type()));
                response.data_uri_prefix =
                    Some(data_uri.chars().take(DATA_URI_PREFIX_LEN).collect());
            } else {
                response.error = Some(format!("HTTP {}", asset.status));
            }
        }
        Err(e) => response.error = Some(e.to_string()),
    }

    info!(
        logo_url,
        success = response.success,
        status = response.status,
        "Logo probed"
    );
    response
}
