//! Presentations: naive per-slide text from `ppt/slides/slideN.xml`.
//!
//! Slides are ordered by the number in the part name, compared numerically so
//! `slide2.xml` comes before `slide10.xml`. Each slide contributes the text of
//! its `a:t` runs in document order, joined by single spaces. Notes, layouts
//! and masters are ignored.

use crate::error::PipelineError;
use crate::kind::FileKind;
use crate::pipeline::ooxml::{open_archive, read_part};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// A slide part located in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlidePart {
    path: String,
    /// The digits as written in the part name, used for the heading.
    label: String,
    number: u64,
}

/// Render every slide with text as `"\n\n### Slide N\n<text>"`.
///
/// Returns `Ok(None)` when no slide has any text.
pub(crate) fn presentation_text(bytes: &[u8]) -> Result<Option<String>, PipelineError> {
    let mut archive = open_archive(bytes, FileKind::Pptx)?;
    let slides = slide_parts(archive.file_names());
    debug!("Found {} slide parts", slides.len());

    let mut out = String::new();
    for slide in &slides {
        let xml = read_part(&mut archive, &slide.path, FileKind::Pptx)?;
        let text = slide_text(&xml).map_err(|e| {
            PipelineError::extraction(FileKind::Pptx, format!("{}: {e}", slide.path))
        })?;
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!("\n\n### Slide {}\n{}", slide.label, text));
    }

    if out.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(out))
    }
}

/// Pick the slide parts out of the archive listing, sorted by slide number.
fn slide_parts<'a>(names: impl Iterator<Item = &'a str>) -> Vec<SlidePart> {
    let mut slides: Vec<SlidePart> = names
        .filter_map(|path| {
            let caps = RE_SLIDE_PART.captures(path)?;
            let label = caps.get(1)?.as_str().to_string();
            let number = label.parse().ok()?;
            Some(SlidePart {
                path: path.to_string(),
                label,
                number,
            })
        })
        .collect();
    slides.sort_by_key(|s| s.number);
    slides
}

/// All `a:t` contents of one slide, space-joined and trimmed.
fn slide_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut runs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"a:t" => current = Some(String::new()),
            Event::Empty(e) if e.name().as_ref() == b"a:t" => runs.push(String::new()),
            Event::End(e) if e.name().as_ref() == b"a:t" => {
                if let Some(text) = current.take() {
                    runs.push(text);
                }
            }
            Event::Text(t) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(runs.join(" ").trim().to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal hand-built `.pptx` packages.

    use crate::pipeline::ooxml::fixtures::zip_of;

    /// Slide XML whose text body holds one `a:t` run per entry.
    pub(crate) fn slide_xml(runs: &[&str]) -> String {
        let body: String = runs
            .iter()
            .map(|r| format!("<a:r><a:rPr lang=\"en-US\"/><a:t>{r}</a:t></a:r>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p>{body}</a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    /// Build a presentation from `(part path, slide xml)` pairs in archive order.
    pub(crate) fn pptx_of(slides: &[(&str, String)]) -> Vec<u8> {
        let mut parts: Vec<(&str, &str)> = vec![(
            "ppt/presentation.xml",
            r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
        )];
        parts.extend(slides.iter().map(|(path, xml)| (*path, xml.as_str())));
        zip_of(&parts)
    }
}
