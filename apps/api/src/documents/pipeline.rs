//! Render orchestration: template → filled markup → PDF.
//!
//! 1. load template            → `TemplateMissing` on failure
//! 2-5. fill (logo, placeholders, fallbacks, label sizing)
//! 6. render with fixed page geometry → `RenderFailed` on failure
//!
//! The render session is released on every path out of step 6. A release
//! failure is logged and never replaces the render outcome.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::render::{PdfEngine, RenderError, RenderOptions};
use crate::state::AppState;
use crate::template::{FieldMapping, FillOptions, FilledDocument, LogoMode};

/// Reads the template. A missing or unreadable file aborts before any substitution.
pub async fn load_template(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::TemplateMissing(format!("{}: {e}", path.display()))
    })
}

/// Steps 1–5: the final markup, ready for the renderer.
pub async fn build_document(
    state: &AppState,
    mapping: &FieldMapping,
    logo_mode: LogoMode,
) -> Result<FilledDocument, AppError> {
    let template = load_template(&state.config.template_path).await?;

    let options = FillOptions {
        logo_mode,
        generation_date: Utc::now().date_naive(),
    };

    Ok(state
        .engine
        .fill(&template, mapping, &options, state.fetcher.as_ref())
        .await)
}

/// Step 6: acquires a render session, renders once, and always releases it.
pub async fn render_pdf(
    engine: &dyn PdfEngine,
    html: &str,
    options: &RenderOptions,
    timeout: Duration,
) -> Result<Vec<u8>, AppError> {
    let started = Instant::now();
    let mut session = engine.launch().await?;

    let outcome = match tokio::time::timeout(timeout, session.render(html, options)).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout(timeout.as_secs())),
    };

    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to release render session");
    }

    match outcome {
        Ok(pdf) => {
            info!(
                bytes = pdf.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "PDF rendered"
            );
            Ok(pdf)
        }
        Err(e) => {
            error!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "PDF render failed"
            );
            Err(AppError::RenderFailed(e))
        }
    }
}

/// Full pipeline for one request.
pub async fn generate_term_sheet(
    state: &AppState,
    mapping: &FieldMapping,
    logo_mode: LogoMode,
) -> Result<Vec<u8>, AppError> {
    let document = build_document(state, mapping, logo_mode).await?;

    render_pdf(
        state.renderer.as_ref(),
        &document.html,
        &state.render_options,
        state.config.render_timeout,
    )
    .await
}
