//! Input resolution: turn a user-supplied path or URL into a [`SourceFile`].
//!
//! ## Why keep bytes in memory?
//!
//! Every extractor works on a byte slice (zip archives are opened through a
//! `Cursor`, PDFs are base64-encoded whole), so there is nothing to gain from
//! a temp file. A `SourceFile` is the raw file handle the session tracker
//! owns: a name plus its bytes, cheap to share via `Arc` with the task that
//! converts it.

use crate::error::Office2MdError;
use crate::kind::{extension_of, FileKind};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A raw input file: its original name and full content.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercase extension of the file name.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    /// Kind derived from the file name.
    pub fn kind(&self) -> FileKind {
        FileKind::classify(&self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory file.
///
/// If the input is a URL, download it. If the input is a local file, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<SourceFile, Office2MdError> {
    if input.trim().is_empty() {
        return Err(Office2MdError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Expand directory inputs one level deep, the way a folder picker hands
/// over the files directly inside the chosen folder.
///
/// Files and URLs pass through untouched; directory entries are sorted by
/// name so batch order is stable across runs. Hidden files are skipped.
pub async fn expand_inputs(inputs: &[String]) -> Result<Vec<String>, Office2MdError> {
    let mut expanded = Vec::with_capacity(inputs.len());

    for input in inputs {
        let path = PathBuf::from(input);
        if is_url(input) || !path.is_dir() {
            expanded.push(input.clone());
            continue;
        }

        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| map_io_error(&path, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io_error(&path, e))?
        {
            let entry_path = entry.path();
            let hidden = entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if entry_path.is_file() && !hidden {
                files.push(entry_path);
            }
        }
        files.sort();
        debug!("Expanded {} into {} files", path.display(), files.len());
        expanded.extend(files.into_iter().map(|p| p.to_string_lossy().into_owned()));
    }

    Ok(expanded)
}

/// Read a local file into memory.
async fn read_local(path: &Path) -> Result<SourceFile, Office2MdError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_io_error(path, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    debug!("Read local file: {} ({} bytes)", path.display(), bytes.len());
    Ok(SourceFile::new(name, bytes))
}

fn map_io_error(path: &Path, e: std::io::Error) -> Office2MdError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => Office2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => Office2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => Office2MdError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    }
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceFile, Office2MdError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Office2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Office2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Office2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Office2MdError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let name = extract_filename(url, content_type.as_deref());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Office2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(SourceFile::new(name, bytes.to_vec()))
}

/// Pick a file name for a downloaded document.
///
/// The last URL path segment wins when it has an extension; otherwise the
/// extension is guessed from the `Content-Type` so the kind can still be
/// classified.
fn extract_filename(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    let ext = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim())
        .and_then(extension_for_mime);
    match ext {
        Some(ext) => format!("downloaded.{ext}"),
        None => "downloaded".to_string(),
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime {
        "application/pdf" => "pdf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "text/csv" => "csv",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "application/json" => "json",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(
            extract_filename("https://example.com/files/report.xlsx?x=1", None),
            "report.xlsx"
        );
    }

    #[test]
    fn filename_from_content_type() {
        assert_eq!(
            extract_filename("https://example.com/export", Some("text/csv; charset=utf-8")),
            "downloaded.csv"
        );
        assert_eq!(
            extract_filename("https://example.com/export", Some("image/png")),
            "downloaded"
        );
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let file = SourceFile::new("a.csv", b"a,b\n1,2".to_vec());
        let dbg = format!("{file:?}");
        assert!(dbg.contains("a.csv"));
        assert!(dbg.contains("<7 bytes>"));
    }

    #[tokio::test]
    async fn resolve_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2").unwrap();

        let file = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(file.name, "data.csv");
        assert_eq!(file.bytes, b"a,b\n1,2");
        assert_eq!(file.kind(), FileKind::Csv);
    }

    #[tokio::test]
    async fn resolve_missing_file() {
        let err = resolve_input("/definitely/not/here.docx", 5).await.unwrap_err();
        assert!(matches!(err, Office2MdError::FileNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn resolve_empty_input_is_invalid() {
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, Office2MdError::InvalidInput { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn expand_directory_one_level_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.csv"), "a").unwrap();
        std::fs::write(dir.path().join(".hidden"), "h").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.md"), "c").unwrap();

        let inputs = vec![
            dir.path().to_string_lossy().into_owned(),
            "https://example.com/x.pdf".to_string(),
        ];
        let expanded = expand_inputs(&inputs).await.unwrap();

        assert_eq!(expanded.len(), 3);
        assert!(expanded[0].ends_with("a.csv"));
        assert!(expanded[1].ends_with("b.txt"));
        assert_eq!(expanded[2], "https://example.com/x.pdf");
    }
}
