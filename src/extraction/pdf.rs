use std::env;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tempfile::tempdir;
use tokio::process::Command;
use tracing::info;

use super::PDF_MIME;
use crate::error::ExtractError;

pub type ExtractFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ExtractError>> + Send + 'a>>;

pub trait PdfTextExtractor: Send + Sync {
    fn extract<'a>(&'a self, pdf: &'a [u8]) -> ExtractFuture<'a>;
}

/// Extracts text with poppler's `pdftotext`.
#[derive(Debug, Clone)]
pub struct Pdftotext {
    program: String,
}

impl Default for Pdftotext {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }
}

impl Pdftotext {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PdfTextExtractor for Pdftotext {
    fn extract<'a>(&'a self, pdf: &'a [u8]) -> ExtractFuture<'a> {
        Box::pin(async move {
            if !looks_like_pdf(pdf) {
                return Err(ExtractError::Unreadable(
                    "uploaded file is not a readable PDF".to_string(),
                ));
            }
            if !command_exists(&self.program) {
                return Err(ExtractError::Unavailable(format!(
                    "pdf text extraction requires {} (install poppler-utils)",
                    self.program
                )));
            }

            let dir = tempdir().map_err(|err| {
                ExtractError::Unavailable(format!("failed to create temp dir for pdf: {}", err))
            })?;
            let input_path = dir.path().join("input.pdf");
            tokio::fs::write(&input_path, pdf).await.map_err(|err| {
                ExtractError::Unavailable(format!("failed to write temp pdf: {}", err))
            })?;

            let output = Command::new(&self.program)
                .arg("-enc")
                .arg("UTF-8")
                .arg(&input_path)
                .arg("-")
                .output()
                .await
                .map_err(|err| {
                    ExtractError::Unavailable(format!("failed to run {}: {}", self.program, err))
                })?;
            // pdftotext exits non-zero for damaged or encrypted files.
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ExtractError::Unreadable(format!(
                    "{} could not read the PDF: {}",
                    self.program,
                    stderr.trim()
                )));
            }

            let text = String::from_utf8_lossy(&output.stdout)
                .replace('\u{c}', "\n")
                .trim()
                .to_string();
            info!("pdf: extracted {} chars", text.chars().count());
            Ok(text)
        })
    }
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    infer::get(bytes)
        .map(|kind| kind.mime_type() == PDF_MIME)
        .unwrap_or(false)
}

pub(crate) fn command_exists(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return path.is_file();
    }
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| dir.join(cmd).is_file())
}
