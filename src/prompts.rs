//! Instruction text and fixed notes for document-to-Markdown conversion.
//!
//! Centralising every prompt and canned message here serves two purposes:
//!
//! 1. **Single source of truth**: changing the conversion rules requires
//!    editing exactly one place.
//!
//! 2. **Testability**: the fixed notes are part of the observable output
//!    (empty spreadsheets complete with `"> Empty spreadsheet."`), so tests
//!    import these constants instead of repeating string literals.
//!
//! Callers can override the rules via
//! [`crate::config::ConversionConfig::system_prompt`]; the filename line is
//! always appended.

/// Default conversion rules sent ahead of every document.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert document-to-markdown converter.
Your task is to take the provided document content and convert it into clean, well-structured Markdown.

GUIDELINES:
1. Preserve all headers, lists (ordered and unordered), and tables.
2. If the input is a spreadsheet, format it as a Markdown table.
3. Remove excessive whitespace, artifacts, or page numbers if they break the flow.
4. Do not include any conversational filler (e.g., "Here is the markdown"). Output ONLY the markdown.
5. If the content is empty or unreadable, return a brief note explaining why in a blockquote."#;

/// Separator placed between the instruction and inline document text.
pub const DOCUMENT_CONTENT_DELIMITER: &str = "\n\n--- DOCUMENT CONTENT ---\n\n";

/// Returned when the service answers with no text at all.
pub const NO_CONTENT_GENERATED: &str = "> No content generated.";

/// Used when the service fails without saying why.
pub const CONVERSION_FALLBACK_ERROR: &str = "Failed to process with the generative service";

/// Completed result for a Word document with no extractable text.
pub const EMPTY_DOCUMENT_NOTE: &str = "> Empty document or unable to extract text.";

/// Completed result for a workbook whose sheets are all empty.
pub const EMPTY_SPREADSHEET_NOTE: &str = "> Empty spreadsheet.";

/// Completed result for a presentation whose slides carry no text.
pub const EMPTY_PRESENTATION_NOTE: &str = "> Empty presentation or unable to extract text.";

/// Build the full instruction for one file: the rules plus its original name.
pub fn build_instruction(rules: &str, original_name: &str) -> String {
    format!("{rules}\n\nOriginal Filename: {original_name}")
}
