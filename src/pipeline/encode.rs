//! Binary encoding: raw bytes → base64 for inline request data.
//!
//! Generative APIs accept non-text attachments (PDFs here) as base64 strings
//! embedded in the JSON request body, tagged with a MIME type. Standard
//! padding alphabet, no data-URI prefix; the MIME type travels separately.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type attached to PDF payloads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Base64-encode a whole file for inline transport.
pub fn encode_binary(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pdf_header() {
        let data = encode_binary(b"%PDF-1.7\n");
        assert_eq!(data, "JVBERi0xLjcK");
        let decoded = STANDARD.decode(&data).expect("valid base64");
        assert_eq!(decoded, b"%PDF-1.7\n");
    }

    #[test]
    fn encode_empty() {
        assert_eq!(encode_binary(b""), "");
    }
}
