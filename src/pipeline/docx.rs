//! Word documents: flat raw text from `word/document.xml`.
//!
//! Only text survives. Each paragraph ends with a blank line, `w:tab` inside
//! a run becomes a tab and `w:br`/`w:cr` become line breaks. Deleted
//! revisions (`w:delText`) and field codes (`w:instrText`) are skipped
//! because they are never shown to a reader.

use crate::error::PipelineError;
use crate::kind::FileKind;
use crate::pipeline::ooxml::{open_archive, read_part};
use quick_xml::events::Event;
use quick_xml::Reader;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the raw text of a `.docx` package.
pub(crate) fn extract_raw_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = open_archive(bytes, FileKind::Docx)?;
    let xml = read_part(&mut archive, DOCUMENT_PART, FileKind::Docx)?;
    document_text(&xml)
}

fn document_text(xml: &str) -> Result<String, PipelineError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                b"w:tab" if in_run => out.push('\t'),
                b"w:br" | b"w:cr" if in_run => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if in_run => out.push('\t'),
                b"w:br" | b"w:cr" if in_run => out.push('\n'),
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| PipelineError::extraction(FileKind::Docx, e))?;
                out.push_str(&text);
            }
            Ok(Event::CData(c)) if in_text => {
                out.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PipelineError::extraction(
                    FileKind::Docx,
                    format!(
                        "{DOCUMENT_PART} at position {}: {e}",
                        reader.buffer_position()
                    ),
                ))
            }
        }
    }

    Ok(out)
}
