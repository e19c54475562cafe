//! Render collaborator — HTML → PDF.
//!
//! A [`PdfEngine`] hands out one [`RenderSession`] per request. The session is a
//! scoped resource: whoever launches it must call [`RenderSession::close`] on
//! every exit path (see `documents::pipeline`).

pub mod chromium;

use async_trait::async_trait;
use thiserror::Error;

pub use chromium::ChromiumEngine;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start renderer: {0}")]
    Launch(String),

    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("renderer exited with {status}: {stderr}")]
    Process { status: String, stderr: String },

    #[error("render timed out after {0}s")]
    Timeout(u64),

    #[error("renderer produced an empty document")]
    EmptyOutput,
}

/// Page size. The term sheet is laid out for A4 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    #[default]
    A4,
}

impl PageFormat {
    pub fn css_size(&self) -> &'static str {
        match self {
            PageFormat::A4 => "A4",
        }
    }
}

/// Page margins as CSS lengths (`0.5in`, `10mm`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMargins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl PageMargins {
    pub fn uniform(length: &str) -> Self {
        Self {
            top: length.to_string(),
            right: length.to_string(),
            bottom: length.to_string(),
            left: length.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: PageFormat,
    pub margins: PageMargins,
    pub print_background: bool,
}

impl RenderOptions {
    pub fn new(margins: PageMargins) -> Self {
        Self {
            format: PageFormat::A4,
            margins,
            print_background: true,
        }
    }

    /// `@page` rules that pin the page geometry regardless of the template's own CSS.
    pub fn page_css(&self) -> String {
        let m = &self.margins;
        let mut css = format!(
            "@page {{ size: {}; margin: {} {} {} {}; }}",
            self.format.css_size(),
            m.top,
            m.right,
            m.bottom,
            m.left
        );
        if self.print_background {
            css.push_str(" html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }");
        }
        css
    }
}

/// Inserts the page rules before `</head>`, or at the very start when there is no head.
pub fn with_page_rules(html: &str, options: &RenderOptions) -> String {
    let style = format!("<style>{}</style>", options.page_css());
    match html.to_ascii_lowercase().find("</head>") {
        Some(pos) => format!("{}{}{}", &html[..pos], style, &html[pos..]),
        None => format!("{style}{html}"),
    }
}

#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Acquires a fresh rendering instance for one request.
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

#[async_trait]
pub trait RenderSession: Send {
    /// Renders the markup once layout and network activity have settled.
    async fn render(&mut self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError>;

    /// Releases the instance. Must be called exactly once.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

#[cfg(test)]
pub mod testing {
    //! In-memory engine that records launches, renders and releases.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    #[derive(Clone)]
    pub enum Behavior {
        Succeed(Vec<u8>),
        Fail,
        Hang,
        FailLaunch,
    }

    #[derive(Default)]
    pub struct Counters {
        pub launches: AtomicUsize,
        pub renders: AtomicUsize,
        pub releases: AtomicUsize,
        pub last_html: Mutex<Option<String>>,
    }

    pub struct FakeEngine {
        behavior: Behavior,
        fail_release: bool,
        pub counters: Arc<Counters>,
    }

    impl FakeEngine {
        pub fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                fail_release: false,
                counters: Arc::new(Counters::default()),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(Behavior::Succeed(b"%PDF-1.7 fake".to_vec()))
        }

        pub fn failing_release(mut self) -> Self {
            self.fail_release = true;
            self
        }

        pub fn launches(&self) -> usize {
            self.counters.launches.load(Ordering::SeqCst)
        }

        pub fn releases(&self) -> usize {
            self.counters.releases.load(Ordering::SeqCst)
        }

        pub fn last_html(&self) -> Option<String> {
            self.counters.last_html.lock().unwrap().clone()
        }
    }

    struct FakeSession {
        behavior: Behavior,
        fail_release: bool,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl PdfEngine for FakeEngine {
        async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
            if matches!(self.behavior, Behavior::FailLaunch) {
                return Err(RenderError::Launch("browser binary missing".into()));
            }
            self.counters.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                behavior: self.behavior.clone(),
                fail_release: self.fail_release,
                counters: Arc::clone(&self.counters),
            }))
        }
    }

    #[async_trait]
    impl RenderSession for FakeSession {
        async fn render(&mut self, html: &str, _options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
            self.counters.renders.fetch_add(1, Ordering::SeqCst);
            *self.counters.last_html.lock().unwrap() = Some(html.to_string());
            match &self.behavior {
                Behavior::Succeed(bytes) => Ok(bytes.clone()),
                Behavior::Fail | Behavior::FailLaunch => Err(RenderError::Process {
                    status: "exit status: 1".into(),
                    stderr: "page crashed".into(),
                }),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }

        async fn close(self: Box<Self>) -> Result<(), RenderError> {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                Err(RenderError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "profile directory busy",
                )))
            } else {
                Ok(())
            }
        }
    }
}
