//! Headless Chromium renderer.
//!
//! Each session owns a private temp directory holding the page, the output PDF
//! and the browser profile, so concurrent requests never share browser state.
//! Closing the session removes the directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use crate::render::{with_page_rules, PdfEngine, RenderError, RenderOptions, RenderSession};

/// Virtual time the browser is given to finish network fetches and layout
/// before printing.
const SETTLE_BUDGET_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    binary: PathBuf,
}

impl ChromiumEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl PdfEngine for ChromiumEngine {
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let workdir = tempfile::Builder::new()
            .prefix("termsheet-render-")
            .tempdir()
            .map_err(|e| RenderError::Launch(format!("cannot create work directory: {e}")))?;

        debug!(workdir = %workdir.path().display(), "Render session started");

        Ok(Box::new(ChromiumSession {
            binary: self.binary.clone(),
            workdir,
        }))
    }
}

struct ChromiumSession {
    binary: PathBuf,
    workdir: TempDir,
}

impl ChromiumSession {
    fn command(&self, page: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--hide-scrollbars")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            .arg(format!("--virtual-time-budget={SETTLE_BUDGET_MS}"))
            .arg(format!(
                "--user-data-dir={}",
                self.workdir.path().join("profile").display()
            ))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", page.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn render(&mut self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        let page = self.workdir.path().join("page.html");
        let output = self.workdir.path().join("output.pdf");

        tokio::fs::write(&page, with_page_rules(html, options)).await?;

        let result = self.command(&page, &output).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RenderError::Launch(format!("browser not found at {}", self.binary.display()))
            } else {
                RenderError::Io(e)
            }
        })?;

        if !result.status.success() {
            return Err(RenderError::Process {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let pdf = tokio::fs::read(&output).await?;
        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        debug!(bytes = pdf.len(), "Chromium printed page");
        Ok(pdf)
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        let workdir = self.workdir;
        tokio::task::spawn_blocking(move || workdir.close())
            .await
            .map_err(|e| RenderError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        Ok(())
    }
}
