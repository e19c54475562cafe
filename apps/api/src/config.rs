use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::render::PageMargins;
use crate::template::logo::LogoMode;

pub const DEFAULT_LOGO_URL: &str = "https://yvykefnhoxuvovczsucw.supabase.co/storage/v1/object/public/documint-uploads/Full%20Mark%20-%20Loans%20-%20Orange%20-%2020230622%20-%20Smashed%20Media.svg";

/// Markup that renders without any network access. Used when the logo cannot be fetched.
pub const DEFAULT_LOGO_FALLBACK_HTML: &str = r#"<div style="background: orange; color: black; padding: 10px; font-weight: bold; max-width: 200px;">BRRRR LOANS</div>"#;

pub const DEFAULT_ACCENT_COLOR: &str = "#f97316";

/// Application configuration loaded from environment variables.
/// Every option has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub template_path: PathBuf,
    pub default_logo_url: String,
    pub logo_fallback_html: String,
    pub logo_mode: LogoMode,
    pub accent_color: String,
    pub page_margins: PageMargins,
    pub logo_fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub chromium_path: String,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_margin = "0.5in";

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            template_path: PathBuf::from(env_or("TEMPLATE_PATH", "templates/dscr-term-sheet.html")),
            default_logo_url: env_or("DEFAULT_LOGO_URL", DEFAULT_LOGO_URL),
            logo_fallback_html: env_or("LOGO_FALLBACK_HTML", DEFAULT_LOGO_FALLBACK_HTML),
            logo_mode: env_or("LOGO_MODE", "url")
                .parse::<LogoMode>()
                .map_err(anyhow::Error::msg)
                .context("LOGO_MODE must be one of: url, inline, literal")?,
            accent_color: env_or("ACCENT_COLOR", DEFAULT_ACCENT_COLOR),
            page_margins: PageMargins {
                top: env_or("PAGE_MARGIN_TOP", default_margin),
                right: env_or("PAGE_MARGIN_RIGHT", default_margin),
                bottom: env_or("PAGE_MARGIN_BOTTOM", default_margin),
                left: env_or("PAGE_MARGIN_LEFT", default_margin),
            },
            logo_fetch_timeout: Duration::from_secs(
                env_or("LOGO_FETCH_TIMEOUT_SECS", "10")
                    .parse::<u64>()
                    .context("LOGO_FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            render_timeout: Duration::from_secs(
                env_or("RENDER_TIMEOUT_SECS", "60")
                    .parse::<u64>()
                    .context("RENDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            chromium_path: env_or("CHROMIUM_PATH", "chromium"),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "generated")),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Configuration with fixed defaults, pointed at the given template and output paths.
    pub fn for_tests(template_path: PathBuf, output_dir: PathBuf) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            template_path,
            default_logo_url: "https://example.com/logo.svg".to_string(),
            logo_fallback_html: DEFAULT_LOGO_FALLBACK_HTML.to_string(),
            logo_mode: LogoMode::Url,
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            page_margins: PageMargins::uniform("0.5in"),
            logo_fetch_timeout: Duration::from_secs(1),
            render_timeout: Duration::from_secs(5),
            chromium_path: "chromium".to_string(),
            output_dir,
        }
    }
}
