//! Logo Resolver — decides the single value that replaces every `{{ logo_url }}`.
//!
//! `{{ logo }}` is the element form of the same resolution: an `<img>` for an
//! address or data URI, the literal markup otherwise. Templates that place the
//! logo in content position use it so every mode yields well-formed markup.
//!
//! Resolution never fails: an unreachable logo degrades to the configured
//! literal markup, which renders with no network access.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::fetch::AssetFetcher;

/// How the logo is resolved for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoMode {
    /// Pass the address through; the renderer fetches it at render time.
    #[default]
    Url,
    /// Fetch now and embed as a data URI, falling back to literal markup.
    Inline,
    /// Always use the literal markup; no network.
    Literal,
}

impl FromStr for LogoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(LogoMode::Url),
            "inline" => Ok(LogoMode::Inline),
            "literal" => Ok(LogoMode::Literal),
            other => Err(format!("unknown logo mode '{other}'")),
        }
    }
}

impl fmt::Display for LogoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogoMode::Url => "url",
            LogoMode::Inline => "inline",
            LogoMode::Literal => "literal",
        })
    }
}

/// The resolved logo. Exactly one variant is used for a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLogo {
    Url(String),
    DataUri(String),
    Markup(String),
}

impl ResolvedLogo {
    pub fn as_replacement(&self) -> &str {
        match self {
            ResolvedLogo::Url(s) | ResolvedLogo::DataUri(s) | ResolvedLogo::Markup(s) => s,
        }
    }

    /// Replacement for `{{ logo }}`: always element content.
    pub fn as_block(&self) -> Cow<'_, str> {
        match self {
            ResolvedLogo::Url(src) | ResolvedLogo::DataUri(src) => Cow::Owned(format!(
                "<img src=\"{}\" alt=\"Logo\">",
                escape_attribute(src)
            )),
            ResolvedLogo::Markup(markup) => Cow::Borrowed(markup),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedLogo::Url(_) => "url",
            ResolvedLogo::DataUri(_) => "data_uri",
            ResolvedLogo::Markup(_) => "markup",
        }
    }
}

fn escape_attribute(value: &str) -> Cow<'_, str> {
    if value.contains(['&', '"']) {
        Cow::Owned(value.replace('&', "&amp;").replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

#[derive(Debug, Clone)]
pub struct LogoResolver {
    default_url: String,
    fallback_markup: String,
}

impl LogoResolver {
    pub fn new(default_url: impl Into<String>, fallback_markup: impl Into<String>) -> Self {
        Self {
            default_url: default_url.into(),
            fallback_markup: fallback_markup.into(),
        }
    }

    pub async fn resolve(
        &self,
        mode: LogoMode,
        requested: Option<&str>,
        fetcher: &dyn AssetFetcher,
    ) -> ResolvedLogo {
        let address = requested.unwrap_or(&self.default_url);

        let resolved = match mode {
            LogoMode::Url => ResolvedLogo::Url(address.to_string()),
            LogoMode::Literal => ResolvedLogo::Markup(self.fallback_markup.clone()),
            LogoMode::Inline => match fetcher.fetch(address).await.and_then(|a| a.into_success()) {
                Ok(asset) => {
                    info!(
                        address,
                        media_type = asset.media_type(),
                        bytes = asset.bytes.len(),
                        "Logo embedded as data URI"
                    );
                    ResolvedLogo::DataUri(asset.to_data_uri())
                }
                Err(e) => {
                    warn!(address, error = %e, "Logo fetch failed, using literal fallback");
                    ResolvedLogo::Markup(self.fallback_markup.clone())
                }
            },
        };

        info!(
            mode = %mode,
            caller_supplied = requested.is_some(),
            outcome = resolved.kind(),
            "Logo resolved"
        );
        resolved
    }
}
