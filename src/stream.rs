//! Streaming conversion API: emit files as they complete.
//!
//! Unlike [`crate::convert::convert_batch`], which returns only after every
//! file is terminal, [`convert_stream`] yields a [`FileOutcome`] per file as
//! soon as its conversion finishes. Every file is in flight at once, so
//! outcomes arrive in completion order, not input order.

use crate::config::ConversionConfig;
use crate::convert::resolve_client;
use crate::error::Office2MdError;
use crate::output::FileOutcome;
use crate::pipeline::input::SourceFile;
use crate::pipeline::run_file;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = FileOutcome> + Send>>;

/// Convert `files` to Markdown, streaming outcomes as they are ready.
///
/// # Returns
/// - `Ok(OutcomeStream)`: one item per input file; per-file failures are
///   carried in [`FileOutcome::result`]
/// - `Err(Office2MdError)`: no provider could be resolved
///
/// # Example
/// ```rust,no_run
/// use edgequake_office2md::{convert_stream, ConversionConfig, SourceFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![SourceFile::new("a.csv", std::fs::read("a.csv")?)];
/// let mut stream = convert_stream(files, &ConversionConfig::default())?;
/// while let Some(outcome) = stream.next().await {
///     match outcome.result {
///         Ok(md) => println!("{}: {} chars", outcome.name, md.len()),
///         Err(e) => eprintln!("{}: {e}", outcome.name),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    files: Vec<SourceFile>,
    config: &ConversionConfig,
) -> Result<OutcomeStream, Office2MdError> {
    let client = resolve_client(config)?;
    let in_flight = files.len().max(1);
    info!("Starting streaming conversion of {} file(s)", files.len());

    let s = stream::iter(files.into_iter().map(move |file| {
        let client = client.clone();
        async move {
            let name = file.name.clone();
            let kind = file.kind();
            let result = run_file(&client, Arc::new(file), kind).await;
            FileOutcome { name, kind, result }
        }
    }))
    .buffer_unordered(in_flight);

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::testing::StubBackend;
    use crate::pipeline::llm::GenerativeBackend;

    #[tokio::test]
    async fn every_file_yields_one_outcome() {
        let stub = Arc::new(StubBackend::replying("# md"));
        let config = ConversionConfig::builder()
            .backend(Arc::clone(&stub) as Arc<dyn GenerativeBackend>)
            .build()
            .unwrap();
        let files = vec![
            SourceFile::new("a.csv", b"1,2".to_vec()),
            SourceFile::new("b.zip", b"PK".to_vec()),
            SourceFile::new("c.md", b"# c".to_vec()),
        ];

        let mut outcomes: Vec<FileOutcome> = convert_stream(files, &config).unwrap().collect().await;
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].result, Ok("# md".to_string()));
        assert_eq!(
            outcomes[1].result.as_ref().unwrap_err().to_string(),
            "Unsupported file type: .zip"
        );
        assert_eq!(outcomes[2].result, Ok("# md".to_string()));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn empty_input_is_an_empty_stream() {
        let stub = Arc::new(StubBackend::silent());
        let config = ConversionConfig::builder()
            .backend(stub as Arc<dyn GenerativeBackend>)
            .build()
            .unwrap();
        let outcomes: Vec<FileOutcome> = convert_stream(vec![], &config).unwrap().collect().await;
        assert!(outcomes.is_empty());
    }
}
