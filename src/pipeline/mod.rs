//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, and every step
//! is a function of its inputs: no stage keeps state between files.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──────────────────▶ llm
//! (path/URL) (docx|xlsx|pptx|encode)    (generative service)
//!               │
//!               └─▶ empty-content note (service never called)
//! ```
//!
//! 1. [`input`]  : read a local path or download a URL into a [`input::SourceFile`]
//! 2. [`extract`]: route by file kind to a canonical payload; the format
//!    readers live in [`docx`], [`xlsx`], [`pptx`] (with [`ooxml`] helpers)
//!    and [`encode`] for binary pass-through
//! 3. [`llm`]    : one request per file; the only stage with network I/O

pub mod docx;
pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ooxml;
pub mod pptx;
pub mod xlsx;

use crate::error::PipelineError;
use crate::kind::FileKind;
use extract::Extraction;
use input::SourceFile;
use llm::ConversionClient;
use std::sync::Arc;

/// Run one file through extraction and conversion without session tracking.
///
/// Empty Office documents resolve to their fixed note and never reach the
/// service.
pub async fn run_file(
    client: &ConversionClient,
    file: Arc<SourceFile>,
    kind: FileKind,
) -> Result<String, PipelineError> {
    let name = file.name.clone();
    match extract::extract_blocking(file, kind).await? {
        Extraction::Empty(empty) => Ok(empty.note().to_string()),
        Extraction::Payload(payload) => client.convert(payload, &name).await,
    }
}
