//! File-kind classification from the filename extension.
//!
//! The kind is decided exactly once, when a file is ingested, by walking an
//! ordered rule table. It is never recomputed, even if extraction later finds
//! that the bytes do not match what the extension promised (a `.doc` that is
//! really an old binary Word file still has kind `docx` and simply fails
//! extraction).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse document-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Csv,
    /// Everything else. `txt`, `md` and `json` are still extracted as plain
    /// text (see [`is_textual_fallback`]); other extensions are unsupported.
    Other,
}

/// Ordered `(extensions, kind)` rules; the first match wins, default `Other`.
const KIND_RULES: &[(&[&str], FileKind)] = &[
    (&["pdf"], FileKind::Pdf),
    (&["docx", "doc"], FileKind::Docx),
    (&["xlsx", "xls"], FileKind::Xlsx),
    (&["pptx"], FileKind::Pptx),
    (&["csv"], FileKind::Csv),
];

/// Extensions of kind `Other` that are read verbatim as UTF-8 text.
const TEXTUAL_FALLBACK: &[&str] = &["txt", "md", "json"];

impl FileKind {
    /// Classify a lowercase extension.
    pub fn from_extension(ext: &str) -> Self {
        KIND_RULES
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, kind)| *kind)
            .unwrap_or(FileKind::Other)
    }

    /// Classify a filename by its extension.
    pub fn classify(name: &str) -> Self {
        Self::from_extension(&extension_of(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Xlsx => "xlsx",
            FileKind::Pptx => "pptx",
            FileKind::Csv => "csv",
            FileKind::Other => "other",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase extension of `name`: the text after the last `.`.
///
/// A name without a dot yields the whole name lowercased, so `README` is
/// reported as the extension `readme` in the unsupported-format message.
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or("").to_lowercase()
}

/// `true` for extensions that fall back to verbatim text extraction.
pub fn is_textual_fallback(ext: &str) -> bool {
    TEXTUAL_FALLBACK.contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_extensions() {
        assert_eq!(FileKind::classify("report.pdf"), FileKind::Pdf);
        assert_eq!(FileKind::classify("letter.docx"), FileKind::Docx);
        assert_eq!(FileKind::classify("legacy.doc"), FileKind::Docx);
        assert_eq!(FileKind::classify("budget.xlsx"), FileKind::Xlsx);
        assert_eq!(FileKind::classify("budget.xls"), FileKind::Xlsx);
        assert_eq!(FileKind::classify("deck.pptx"), FileKind::Pptx);
        assert_eq!(FileKind::classify("data.csv"), FileKind::Csv);
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(FileKind::classify("SCAN.PDF"), FileKind::Pdf);
        assert_eq!(FileKind::classify("Deck.PptX"), FileKind::Pptx);
    }

    #[test]
    fn unknown_and_textual_extensions_are_other() {
        assert_eq!(FileKind::classify("notes.txt"), FileKind::Other);
        assert_eq!(FileKind::classify("README.md"), FileKind::Other);
        assert_eq!(FileKind::classify("old.ppt"), FileKind::Other);
        assert_eq!(FileKind::classify("archive.tar.gz"), FileKind::Other);
        assert_eq!(FileKind::classify("Makefile"), FileKind::Other);
    }

    #[test]
    fn extension_uses_last_dot() {
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("a.B.Json"), "json");
        assert_eq!(extension_of("Makefile"), "makefile");
    }

    #[test]
    fn textual_fallback_set() {
        assert!(is_textual_fallback("txt"));
        assert!(is_textual_fallback("md"));
        assert!(is_textual_fallback("json"));
        assert!(!is_textual_fallback("exe"));
        assert!(!is_textual_fallback("csv"));
    }

    #[test]
    fn kind_serialises_lowercase() {
        let json = serde_json::to_string(&FileKind::Pptx).unwrap();
        assert_eq!(json, "\"pptx\"");
    }
}
