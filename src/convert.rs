//! Eager conversion entry points.
//!
//! [`convert_bytes`] and [`convert_file`] run one file straight through the
//! pipeline and return its Markdown. [`convert_batch`] goes through a
//! [`SessionTracker`] so every file runs concurrently and fails on its own;
//! it returns once every session is terminal. Use
//! [`crate::stream::convert_stream`] to receive results as they finish.

use crate::config::ConversionConfig;
use crate::error::Office2MdError;
use crate::output::{BatchOutput, BatchStats, FileFailure, FileOutput, Inspection, LoadedInputs};
use crate::pipeline::input::{self, SourceFile};
use crate::pipeline::llm::{ConversionClient, GenerativeBackend, LlmBackend};
use crate::pipeline::{extract, run_file};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::tracker::SessionTracker;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used with Gemini when none is configured. Gemini reads PDFs
/// natively, which the binary pass-through relies on.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Model used with any other named provider when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Convert one in-memory file to Markdown.
///
/// # Errors
/// The file's [`crate::error::PipelineError`] is returned wrapped in
/// [`Office2MdError::Pipeline`]; provider resolution failures are returned
/// as they are.
///
/// # Example
/// ```rust,no_run
/// use edgequake_office2md::{convert_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("budget.xlsx")?;
/// let output = convert_bytes("budget.xlsx", bytes, &ConversionConfig::default()).await?;
/// println!("{}", output.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    name: impl Into<String>,
    bytes: impl Into<Vec<u8>>,
    config: &ConversionConfig,
) -> Result<FileOutput, Office2MdError> {
    let client = resolve_client(config)?;
    convert_source(&client, SourceFile::new(name, bytes)).await
}

/// Convert a local file or HTTP(S) URL to Markdown.
pub async fn convert_file(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<FileOutput, Office2MdError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    let source = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let client = resolve_client(config)?;
    convert_source(&client, source).await
}

/// Convert a file and write the Markdown to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<FileOutput, Office2MdError> {
    let output = convert_file(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.markdown).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<FileOutput, Office2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Office2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(input_str, config))
}

/// Convert many files at once, one session per file.
///
/// Never fails because of a single file: per-file failures are recorded on
/// the sessions. Use [`BatchOutput::into_result`] to turn any failure into an
/// error.
pub async fn convert_batch(
    files: Vec<SourceFile>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Office2MdError> {
    let start = Instant::now();
    let total = files.len();
    let tracker = SessionTracker::from_config(config)?;

    let batch = tracker.ingest(files);
    let ids = batch.ids().to_vec();
    batch.wait().await;

    let sessions: Vec<_> = ids.into_iter().filter_map(|id| tracker.session(id)).collect();
    let stats = BatchStats::from_sessions(total, &sessions, start.elapsed().as_millis() as u64);

    info!(
        "Batch complete: {}/{} files converted, {} failed, {}ms",
        stats.completed, total, stats.failed, stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.completed);
    }

    Ok(BatchOutput { sessions, stats })
}

/// Resolve every input (paths, directories, URLs) into in-memory files.
///
/// Directories contribute their direct, non-hidden files in name order. An
/// input that cannot be listed, read or downloaded is recorded in
/// [`LoadedInputs::failures`] and the rest still load.
pub async fn load_inputs(inputs: &[String], config: &ConversionConfig) -> LoadedInputs {
    let mut loaded = LoadedInputs::default();
    for item in inputs {
        let expanded = match input::expand_inputs(std::slice::from_ref(item)).await {
            Ok(expanded) => expanded,
            Err(e) => {
                warn!("Skipping {}: {}", item, e);
                loaded.failures.push(FileFailure::new(item.as_str(), e));
                continue;
            }
        };
        for path in expanded {
            match input::resolve_input(&path, config.download_timeout_secs).await {
                Ok(file) => loaded.files.push(file),
                Err(e) => {
                    warn!("Skipping {}: {}", path, e);
                    loaded.failures.push(FileFailure::new(path, e));
                }
            }
        }
    }
    debug!(
        "Loaded {} file(s) from {} input(s), {} unreadable",
        loaded.files.len(),
        inputs.len(),
        loaded.failures.len()
    );
    loaded
}

/// Run only the extractor on a file or URL.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<Inspection, Office2MdError> {
    let source = input::resolve_input(input_str.as_ref(), 120).await?;
    inspect_source(source).await
}

/// Run only the extractor on an in-memory file.
pub async fn inspect_source(source: SourceFile) -> Result<Inspection, Office2MdError> {
    let kind = source.kind();
    let name = source.name.clone();
    let size_bytes = source.len();
    let extraction = extract::extract_blocking(Arc::new(source), kind).await?;
    Ok(Inspection {
        name,
        kind,
        size_bytes,
        extraction,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_source(
    client: &ConversionClient,
    source: SourceFile,
) -> Result<FileOutput, Office2MdError> {
    let start = Instant::now();
    let name = source.name.clone();
    let kind = source.kind();
    let markdown = run_file(client, Arc::new(source), kind).await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Converted {} ({}) in {}ms", name, kind, duration_ms);
    Ok(FileOutput {
        name,
        kind,
        markdown,
        duration_ms,
    })
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), Office2MdError> {
    let write_err = |e| Office2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Build the conversion client for `config`.
pub(crate) fn resolve_client(config: &ConversionConfig) -> Result<ConversionClient, Office2MdError> {
    let rules = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
    Ok(ConversionClient::new(resolve_backend(config)?, rules))
}

/// Resolve the generative backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Pre-built provider** (`config.provider`).
/// 3. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    when both are set.
/// 5. **Gemini** when `GEMINI_API_KEY` is set, since it reads PDFs natively.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_backend(config: &ConversionConfig) -> Result<Arc<dyn GenerativeBackend>, Office2MdError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmBackend::new(provider, config)))
}

fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, Office2MdError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config
            .model
            .as_deref()
            .unwrap_or_else(|| default_model_for(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            return create_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Office2MdError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn default_model_for(provider_name: &str) -> &'static str {
    if provider_name.eq_ignore_ascii_case("gemini") {
        DEFAULT_GEMINI_MODEL
    } else {
        DEFAULT_MODEL
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Office2MdError> {
    debug!("Using provider {} with model {}", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Office2MdError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
