//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct for every knob makes it
//! trivial to share a config between the tracker, the stream and the CLI.

use crate::error::Office2MdError;
use crate::pipeline::llm::GenerativeBackend;
use crate::progress::ConversionProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a document-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_office2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .model("gemini-2.5-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 8192);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses the resolved provider's default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generative backend. Takes precedence over every
    /// provider setting.
    pub backend: Option<Arc<dyn GenerativeBackend>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Conversion is transcription, not writing; low temperature keeps the
    /// model close to the source text.
    pub temperature: f32,

    /// Maximum tokens the model may generate per file. Default: 8192.
    ///
    /// A whole document is converted in one request, so this is set well
    /// above a single page's worth of Markdown.
    pub max_tokens: usize,

    /// Custom conversion rules. If None, uses the built-in rules.
    /// The `Original Filename:` line is appended either way.
    pub system_prompt: Option<String>,

    /// Optional per-file progress events.
    pub progress_callback: Option<Arc<dyn ConversionProgressCallback>>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 8192,
            system_prompt: None,
            progress_callback: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerativeBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Office2MdError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Office2MdError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(Office2MdError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(prompt) = &c.system_prompt {
            if prompt.trim().is_empty() {
                return Err(Office2MdError::InvalidConfig(
                    "system prompt must not be blank".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
