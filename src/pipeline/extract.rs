//! Content extraction: raw file → canonical payload.
//!
//! Every supported kind ends up in one of two shapes the conversion step
//! understands: base64 binary tagged with a MIME type (PDF, which the
//! generative service reads natively) or UTF-8 text (everything else). Office
//! formats with nothing extractable short-circuit to a fixed note so the
//! service is never called for an empty file.
//!
//! Extraction is a pure function of the bytes: same input, same output.

use crate::error::PipelineError;
use crate::kind::{is_textual_fallback, FileKind};
use crate::pipeline::encode::{encode_binary, PDF_MIME_TYPE};
use crate::pipeline::input::SourceFile;
use crate::pipeline::{docx, pptx, xlsx};
use crate::prompts::{EMPTY_DOCUMENT_NOTE, EMPTY_PRESENTATION_NOTE, EMPTY_SPREADSHEET_NOTE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The normalised content handed to the conversion client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum CanonicalPayload {
    /// Base64 data for formats the service reads natively.
    Binary { data: String, mime_type: String },
    /// Pre-extracted or naturally textual content.
    Text { text: String },
}

impl CanonicalPayload {
    pub fn text(text: impl Into<String>) -> Self {
        CanonicalPayload::Text { text: text.into() }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, CanonicalPayload::Binary { .. })
    }

    /// Size of the carried string in bytes (base64 length for binary).
    pub fn len(&self) -> usize {
        match self {
            CanonicalPayload::Binary { data, .. } => data.len(),
            CanonicalPayload::Text { text } => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// "Nothing to convert" outcomes. Not errors: the session completes with the
/// matching note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyContent {
    Document,
    Spreadsheet,
    Presentation,
}

impl EmptyContent {
    /// The fixed Markdown recorded as the session result.
    pub fn note(&self) -> &'static str {
        match self {
            EmptyContent::Document => EMPTY_DOCUMENT_NOTE,
            EmptyContent::Spreadsheet => EMPTY_SPREADSHEET_NOTE,
            EmptyContent::Presentation => EMPTY_PRESENTATION_NOTE,
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extraction {
    Payload(CanonicalPayload),
    Empty(EmptyContent),
}

/// Extract the canonical payload of `file`, routed by its ingestion-time kind.
pub fn extract(file: &SourceFile, kind: FileKind) -> Result<Extraction, PipelineError> {
    let extraction = match kind {
        FileKind::Pdf => Extraction::Payload(CanonicalPayload::Binary {
            data: encode_binary(&file.bytes),
            mime_type: PDF_MIME_TYPE.to_string(),
        }),
        FileKind::Csv => Extraction::Payload(CanonicalPayload::text(decode_text(&file.bytes))),
        FileKind::Docx => {
            let text = docx::extract_raw_text(&file.bytes)?;
            if text.trim().is_empty() {
                Extraction::Empty(EmptyContent::Document)
            } else {
                Extraction::Payload(CanonicalPayload::text(text))
            }
        }
        FileKind::Xlsx => match xlsx::workbook_text(&file.bytes)? {
            Some(text) => Extraction::Payload(CanonicalPayload::text(text)),
            None => Extraction::Empty(EmptyContent::Spreadsheet),
        },
        FileKind::Pptx => match pptx::presentation_text(&file.bytes)? {
            Some(text) => Extraction::Payload(CanonicalPayload::text(text)),
            None => Extraction::Empty(EmptyContent::Presentation),
        },
        FileKind::Other => {
            let extension = file.extension();
            if !is_textual_fallback(&extension) {
                return Err(PipelineError::UnsupportedFormat { extension });
            }
            Extraction::Payload(CanonicalPayload::text(decode_text(&file.bytes)))
        }
    };

    match &extraction {
        Extraction::Payload(p) => debug!(
            "Extracted {} ({}): {} payload, {} bytes",
            file.name,
            kind,
            if p.is_binary() { "binary" } else { "text" },
            p.len()
        ),
        Extraction::Empty(e) => debug!("Extracted {} ({}): empty {:?}", file.name, kind, e),
    }
    Ok(extraction)
}

/// Run [`extract`] on the blocking pool.
///
/// Zip inflation and XML parsing are CPU-bound; keeping them off the async
/// worker threads lets other files' conversion calls make progress.
pub async fn extract_blocking(
    file: Arc<SourceFile>,
    kind: FileKind,
) -> Result<Extraction, PipelineError> {
    tokio::task::spawn_blocking(move || extract(&file, kind))
        .await
        .map_err(|e| PipelineError::extraction(kind, format!("extraction task panicked: {e}")))?
}

/// Decode text the way a browser `readAsText` does: UTF-8, invalid sequences
/// replaced, leading byte-order mark dropped.
fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string()
}
