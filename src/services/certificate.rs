//! Certificate generation for passed results.
//!
//! A certificate is a single A4 page written through a [`CertificateSink`].
//! The path is derived from the candidate, the exam and the completion date
//! only, so regenerating a certificate overwrites the previous file.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

use crate::models::{candidate::Candidate, exam::Exam, result::ExamResult};

/// Directory, relative to the sink root, that holds certificates.
pub const CERTIFICATE_DIR: &str = "certificates";

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("result {0} did not pass; no certificate is issued")]
    NotPassed(i64),

    #[error("failed to render certificate: {0}")]
    Render(String),

    #[error("failed to write certificate '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Somewhere certificate bytes can be written to and later referenced by path.
#[async_trait]
pub trait CertificateSink: Send + Sync {
    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Writes certificates below a root directory (the media root).
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CertificateSink for FsSink {
    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await
    }
}

/// Keeps certificates in memory. Used by tests and local runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CertificateSink for MemorySink {
    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Renders certificates and hands them to a sink.
#[derive(Clone)]
pub struct CertificateGenerator {
    sink: Arc<dyn CertificateSink>,
}

impl CertificateGenerator {
    pub fn new(sink: Arc<dyn CertificateSink>) -> Self {
        Self { sink }
    }

    /// Writes the certificate for a passed result and returns its relative path.
    pub async fn generate(
        &self,
        result: &ExamResult,
        candidate: &Candidate,
        exam: &Exam,
    ) -> Result<String, CertificateError> {
        if !result.is_passed {
            return Err(CertificateError::NotPassed(result.id));
        }

        let path = certificate_path(result, candidate, exam);
        let bytes = render_pdf(&exam.title, &certificate_lines(result, candidate, exam))?;

        self.sink
            .write(&path, &bytes)
            .await
            .map_err(|source| CertificateError::Storage {
                path: path.clone(),
                source,
            })?;

        tracing::info!(result_id = result.id, path = %path, "Certificate written");
        Ok(path)
    }
}

/// `certificates/{candidate id}-{exam id}_{name}_{title}_{YYYYMMDD}.pdf`.
///
/// The id prefix keeps two candidates with the same name apart, including
/// when long names are cut to the same slug.
pub fn certificate_path(result: &ExamResult, candidate: &Candidate, exam: &Exam) -> String {
    format!(
        "{}/{}-{}_{}_{}_{}.pdf",
        CERTIFICATE_DIR,
        candidate.id,
        exam.id,
        slug(&candidate.full_name()),
        slug(&exam.title),
        result.completed_at.format("%Y%m%d"),
    )
}

/// The text printed on the certificate, one entry per line.
pub fn certificate_lines(result: &ExamResult, candidate: &Candidate, exam: &Exam) -> Vec<String> {
    vec![
        "Certificate of Completion".to_string(),
        format!("This certifies that {}", candidate.full_name()),
        format!(
            "has passed the {} exam with {:.1}%.",
            exam.title, result.score
        ),
        format!("Completed on: {}", result.completed_at.format("%B %d, %Y")),
    ]
}

/// Longest slug, in bytes. Keeps the file name and the stored path well
/// inside filesystem and column limits for any name or title.
const MAX_SLUG_BYTES: usize = 40;

/// Reduces a name to path-safe characters: runs of anything that is not
/// alphanumeric become a single '-'. Truncated on a char boundary to
/// [`MAX_SLUG_BYTES`].
fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len().min(MAX_SLUG_BYTES));
    for c in value.chars() {
        let next = if c.is_alphanumeric() {
            c
        } else if !out.is_empty() && !out.ends_with('-') {
            '-'
        } else {
            continue;
        };
        if out.len() + next.len_utf8() > MAX_SLUG_BYTES {
            break;
        }
        out.push(next);
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

fn render_pdf(title: &str, lines: &[String]) -> Result<Vec<u8>, CertificateError> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(210.0), Mm(297.0), "Certificate");
    let layer = doc.get_page(page).get_layer(layer);

    let heading = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| CertificateError::Render(format!("{e:?}")))?;
    let body = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| CertificateError::Render(format!("{e:?}")))?;

    let mut y: f32 = 260.0;
    for (index, line) in lines.iter().enumerate() {
        if index == 0 {
            layer.use_text(line.as_str(), 24.0, Mm(35.0), Mm(y), &heading);
            y -= 25.0;
        } else {
            layer.use_text(line.as_str(), 14.0, Mm(35.0), Mm(y), &body);
            y -= 12.0;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| CertificateError::Render(format!("{e:?}")))
}
