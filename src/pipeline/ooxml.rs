//! Shared plumbing for Office Open XML packages (docx, pptx).
//!
//! Both formats are zip archives of XML parts. These helpers open the archive
//! from an in-memory buffer and read a part as UTF-8, mapping every zip or
//! I/O failure to an extraction error for the given kind.

use crate::error::PipelineError;
use crate::kind::FileKind;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open a zip archive over `bytes`.
pub(crate) fn open_archive(bytes: &[u8], kind: FileKind) -> Result<Archive<'_>, PipelineError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| PipelineError::extraction(kind, e))
}

/// Read one part of the archive as a UTF-8 string.
pub(crate) fn read_part(
    archive: &mut Archive<'_>,
    name: &str,
    kind: FileKind,
) -> Result<String, PipelineError> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| PipelineError::extraction(kind, format!("{name}: {e}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| PipelineError::extraction(kind, format!("{name}: {e}")))?;
    Ok(xml)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory zip builders for extractor tests.

    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a zip archive from `(path, content)` pairs, in the given order.
    pub(crate) fn zip_of(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start zip entry");
            writer
                .write_all(content.as_bytes())
                .expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_existing_part() {
        let bytes = fixtures::zip_of(&[("word/document.xml", "<w:document/>")]);
        let mut archive = open_archive(&bytes, FileKind::Docx).unwrap();
        let xml = read_part(&mut archive, "word/document.xml", FileKind::Docx).unwrap();
        assert_eq!(xml, "<w:document/>");
    }

    #[test]
    fn missing_part_names_the_part() {
        let bytes = fixtures::zip_of(&[("other.xml", "<x/>")]);
        let mut archive = open_archive(&bytes, FileKind::Docx).unwrap();
        let err = read_part(&mut archive, "word/document.xml", FileKind::Docx).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "got: {err}");
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = open_archive(b"definitely not a zip", FileKind::Pptx).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExtractionFailure {
                kind: FileKind::Pptx,
                ..
            }
        ));
    }
}
