use std::sync::Arc;

use crate::config::Config;
use crate::documents::store::DocumentStore;
use crate::fetch::AssetFetcher;
use crate::render::{PdfEngine, RenderOptions};
use crate::template::{FieldSchema, LogoResolver, TemplateEngine};

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every request builds its own markup and render session.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<TemplateEngine>,
    /// Pluggable renderer. Default: headless Chromium.
    pub renderer: Arc<dyn PdfEngine>,
    /// Remote asset fetcher used for logo embedding and the logo probe.
    pub fetcher: Arc<dyn AssetFetcher>,
    pub store: DocumentStore,
    /// Fixed page geometry (A4 + configured margins).
    pub render_options: RenderOptions,
}

impl AppState {
    pub fn new(
        config: Config,
        renderer: Arc<dyn PdfEngine>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        let engine = TemplateEngine::new(
            FieldSchema::term_sheet(),
            LogoResolver::new(&config.default_logo_url, &config.logo_fallback_html),
            &config.accent_color,
        );

        Self {
            engine: Arc::new(engine),
            renderer,
            fetcher,
            store: DocumentStore::new(&config.output_dir),
            render_options: RenderOptions::new(config.page_margins.clone()),
            config,
        }
    }
}
