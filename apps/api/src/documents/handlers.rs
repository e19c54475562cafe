//! Axum route handlers for the Term Sheet API.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::documents::pipeline::{build_document, generate_term_sheet};
use crate::errors::AppError;
use crate::state::AppState;
use crate::template::{FieldMapping, FillReport, LogoMode};

const DOWNLOAD_FILENAME: &str = "term-sheet.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    /// `url` | `inline` | `literal`; defaults to the configured mode.
    pub logo_mode: Option<String>,
}

impl RenderQuery {
    fn logo_mode(&self, default: LogoMode) -> Result<LogoMode, AppError> {
        match &self.logo_mode {
            Some(raw) => raw.parse::<LogoMode>().map_err(AppError::Validation),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub download_url: String,
    pub preview_url: String,
    pub size: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Copy)]
enum Disposition {
    Attachment,
    Inline,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/term-sheets/pdf
///
/// Body: field mapping (JSON object). Streams the rendered PDF back as a download.
pub async fn handle_render_pdf(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let logo_mode = query.logo_mode(state.config.logo_mode)?;
    let mapping = FieldMapping::from_json_slice(&body)?;

    let pdf = generate_term_sheet(&state, &mapping, logo_mode).await?;

    Ok(pdf_response(pdf, DOWNLOAD_FILENAME, Disposition::Attachment))
}

/// POST /api/v1/term-sheets
///
/// Renders the PDF, stores it, and returns links for download and inline preview.
pub async fn handle_generate(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, AppError> {
    let logo_mode = query.logo_mode(state.config.logo_mode)?;
    let mapping = FieldMapping::from_json_slice(&body)?;

    let pdf = generate_term_sheet(&state, &mapping, logo_mode).await?;
    let generated_at = Utc::now();
    let stored = state.store.save(&pdf, generated_at).await?;

    Ok(Json(GenerateResponse {
        success: true,
        message: "PDF generated successfully".to_string(),
        download_url: format!("/api/v1/term-sheets/files/{}", stored.filename),
        preview_url: format!("/api/v1/term-sheets/files/{}/preview", stored.filename),
        filename: stored.filename,
        size: stored.size,
        generated_at,
    }))
}

/// POST /api/v1/term-sheets/html
///
/// Returns the filled markup without rendering. The fill report travels in the
/// `X-Fill-Report` header as JSON.
pub async fn handle_preview_html(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let logo_mode = query.logo_mode(state.config.logo_mode)?;
    let mapping = FieldMapping::from_json_slice(&body)?;

    let document = build_document(&state, &mapping, logo_mode).await?;
    let report = report_header(&document.report);

    Ok(([("x-fill-report", report)], Html(document.html)).into_response())
}

/// GET /api/v1/term-sheets/files/:filename
pub async fn handle_download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let pdf = state.store.read(&filename).await?;
    Ok(pdf_response(pdf, &filename, Disposition::Attachment))
}

/// GET /api/v1/term-sheets/files/:filename/preview
pub async fn handle_preview_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let pdf = state.store.read(&filename).await?;
    Ok(pdf_response(pdf, &filename, Disposition::Inline))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn pdf_response(pdf: Vec<u8>, filename: &str, disposition: Disposition) -> Response {
    let kind = match disposition {
        Disposition::Attachment => "attachment",
        Disposition::Inline => "inline",
    };
    let length = pdf.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("{kind}; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from(pdf))
        .unwrap_or_else(|e| {
            AppError::Internal(anyhow::anyhow!("cannot build PDF response: {e}")).into_response()
        })
}

fn report_header(report: &FillReport) -> String {
    serde_json::to_string(report).unwrap_or_default()
}
