//! CLI binary for edgequake-office2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_office2md::{
    convert_batch, inspect_source, load_inputs, BatchOutput, ConversionConfig,
    ConversionProgressCallback, FileFailure, Inspection, ProgressCallback, SessionId,
    SessionStatus, SourceFile,
};
use serde::Serialize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// finished file. Files finish in any order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<SessionId, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, id: SessionId) -> f64 {
        self.start_times
            .lock()
            .remove(&id)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} file(s)…"))
        ));
    }

    fn on_status_change(&self, id: SessionId, name: &str, status: &SessionStatus) {
        if *status == SessionStatus::Extracting {
            self.start_times.lock().insert(id, Instant::now());
        }
        if !status.is_terminal() {
            self.bar.set_message(format!("{name}: {status}"));
        }
    }

    fn on_file_complete(&self, id: SessionId, name: &str, markdown_len: usize) {
        let secs = self.elapsed_secs(id);
        self.bar.println(format!(
            "  {} {:<40}  {:<8}  {}",
            green("✓"),
            name,
            dim(&format!("{markdown_len:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, id: SessionId, name: &str, error: &str) {
        let secs = self.elapsed_secs(id);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) converted  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r####"EXAMPLES:
  # Convert one file (stdout)
  office2md report.docx

  # Convert a folder, one .md per file
  office2md ./inbox --output-dir ./markdown

  # Mixed inputs, including a URL
  office2md budget.xlsx deck.pptx https://example.com/paper.pdf -d out/

  # Use a specific model
  office2md --provider openai --model gpt-4.1-mini notes.csv

  # See what the extractor produces (no API key needed)
  office2md --extract-only deck.pptx

  # Machine-readable session list
  office2md --json *.docx > sessions.json

SUPPORTED FILES:
  pdf                 sent as-is (base64) to the model
  docx, doc           raw paragraph text
  xlsx, xls           every sheet as CSV under "### Sheet: <name>"
  pptx                slide text under "### Slide N", in slide order
  csv, txt, md, json  sent as text

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred: reads PDFs natively)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. edgequake_office2md=debug)
"####;

/// Convert office documents to Markdown using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "office2md",
    version,
    about = "Convert office documents (PDF, Word, Excel, PowerPoint, CSV, text) to Markdown using LLMs",
    long_about = "Convert office documents to clean, well-structured Markdown. Every file is \
extracted locally and converted with a single LLM request; files run concurrently and fail \
independently.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files, directories (one level deep) or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write one `<name>.md` per converted file into this directory instead of stdout.
    #[arg(short = 'd', long, env = "OFFICE2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini, openai, anthropic, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "OFFICE2MD_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per file.
    #[arg(long, env = "OFFICE2MD_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Path to a text file containing custom conversion rules.
    #[arg(long, env = "OFFICE2MD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output the session list as JSON instead of Markdown.
    #[arg(long, env = "OFFICE2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OFFICE2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Run only the extractor and print what would be sent. No API key needed.
    #[arg(long)]
    extract_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OFFICE2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OFFICE2MD_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "OFFICE2MD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is on screen.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let loaded = load_inputs(&cli.inputs, &config).await;
    report_failures(&loaded.failures, cli.quiet);
    let unreadable = loaded.failures.len();
    let files = loaded.files;
    if files.is_empty() {
        if unreadable > 0 {
            anyhow::bail!("None of the {unreadable} input(s) could be read");
        }
        anyhow::bail!("No input files found");
    }

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        return run_extract_only(&cli, files, unreadable).await;
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_batch(files, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref dir) = cli.output_dir {
        let written = write_outputs(dir, &output).await?;
        if !cli.quiet {
            for path in &written {
                eprintln!("   → {}", bold(&path.display().to_string()));
            }
        }
    } else {
        print_markdown(&output)?;
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Converted {}/{} file(s) in {}ms",
            output.stats.completed, output.stats.total_files, output.stats.duration_ms
        );
        for session in output.failed() {
            eprintln!(
                "  {} {}: {}",
                red("✗"),
                session.name,
                session.status.failure_reason().unwrap_or_default()
            );
        }
    }

    output.into_result().context("Some files failed")?;
    if unreadable > 0 {
        anyhow::bail!("{unreadable} input(s) could not be read");
    }
    Ok(())
}

fn report_failures(failures: &[FileFailure], quiet: bool) {
    if quiet {
        return;
    }
    for failure in failures {
        eprintln!("  {} {}: {}", red("✗"), failure.name, failure.reason);
    }
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// One entry of `--extract-only --json` output.
#[derive(Serialize)]
#[serde(untagged)]
enum ExtractEntry<'a> {
    Extracted(&'a Inspection),
    Failed(&'a FileFailure),
}

/// Run the extractor over every file; a file it rejects is recorded, not fatal.
async fn inspect_all(files: Vec<SourceFile>) -> Vec<Result<Inspection, FileFailure>> {
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let name = file.name.clone();
        reports.push(
            inspect_source(file)
                .await
                .map_err(|e| FileFailure::new(name, e)),
        );
    }
    reports
}

async fn run_extract_only(cli: &Cli, files: Vec<SourceFile>, unreadable: usize) -> Result<()> {
    let reports = inspect_all(files).await;
    let failed = reports.iter().filter(|r| r.is_err()).count();

    if cli.json {
        let entries: Vec<ExtractEntry<'_>> = reports
            .iter()
            .map(|r| match r {
                Ok(report) => ExtractEntry::Extracted(report),
                Err(failure) => ExtractEntry::Failed(failure),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise extraction")?
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for entry in &reports {
            let report = match entry {
                Ok(report) => report,
                Err(failure) => {
                    writeln!(handle, "{} {}  {}\n", red("✗"), bold(&failure.name), failure.reason)?;
                    continue;
                }
            };
            writeln!(
                handle,
                "{} {}  {}  {} bytes  →  {}",
                cyan("◆"),
                bold(&report.name),
                report.kind,
                report.size_bytes,
                report.shape()
            )?;
            match report.text() {
                Some(text) => writeln!(handle, "{}\n", text.trim_end())?,
                None => writeln!(handle, "{}\n", dim("(binary payload, sent as-is)"))?,
            }
        }
    }

    if failed + unreadable > 0 {
        anyhow::bail!("{} file(s) could not be extracted", failed + unreadable);
    }
    Ok(())
}

fn print_markdown(output: &BatchOutput) -> Result<()> {
    let stdout = io::stdout();
    write_markdown(&mut stdout.lock(), output)
}

/// Write every completed session to `handle`. Multiple files are separated
/// by a rule and an HTML comment naming the file.
fn write_markdown<W: Write>(handle: &mut W, output: &BatchOutput) -> Result<()> {
    let multiple = output.sessions.len() > 1;

    for (i, session) in output.completed().enumerate() {
        let Some(markdown) = session.status.markdown() else {
            continue;
        };
        if multiple {
            if i > 0 {
                handle
                    .write_all(b"\n---\n\n")
                    .context("Failed to write to stdout")?;
            }
            writeln!(handle, "<!-- {} -->\n", session.name).context("Failed to write to stdout")?;
        }
        handle
            .write_all(markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !markdown.ends_with('\n') {
            handle.write_all(b"\n").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Write each completed session to `<dir>/<stem>.md`, de-duplicating stems.
async fn write_outputs(dir: &Path, output: &BatchOutput) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut used: HashSet<String> = HashSet::new();
    let mut written = Vec::new();
    for session in output.completed() {
        let Some(markdown) = session.status.markdown() else {
            continue;
        };
        let path = dir.join(format!("{}.md", unique_stem(&session.name, &mut used)));
        let tmp = path.with_extension("md.tmp");
        tokio::fs::write(&tmp, markdown)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// File stem of `name`, suffixed `-2`, `-3`, … when already taken.
fn unique_stem(name: &str, used: &mut HashSet<String>) -> String {
    let base = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());

    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    candidate
}
