//! Conversion client: canonical payload → one generative-service request → Markdown.
//!
//! All prompt text lives in [`crate::prompts`]; this module only decides how
//! the payload travels (inline binary data vs. inline text) and how the
//! service's answer maps onto a session result.
//!
//! The service itself sits behind [`GenerativeBackend`]. Production code uses
//! [`LlmBackend`], which drives an `edgequake_llm` provider; tests plug in a
//! canned double.
//!
//! ## One shot
//!
//! Each file gets exactly one request. There is no retry, streaming or
//! chunking: a failure is reported to the session and the user re-ingests.

use crate::config::ConversionConfig;
use crate::error::PipelineError;
use crate::pipeline::extract::CanonicalPayload;
use crate::prompts::{
    build_instruction, CONVERSION_FALLBACK_ERROR, DEFAULT_SYSTEM_PROMPT,
    DOCUMENT_CONTENT_DELIMITER, NO_CONTENT_GENERATED,
};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// The content part of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContent {
    /// Base64 data the service decodes itself, tagged with its MIME type.
    InlineData { mime_type: String, data: String },
    /// Text appended to the instruction after the document delimiter.
    InlineText { text: String },
}

/// Everything the service sees for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Conversion rules followed by the `Original Filename:` line.
    pub instruction: String,
    pub content: RequestContent,
}

impl ConversionRequest {
    /// The text part of the request.
    ///
    /// For inline text this is the instruction, the document delimiter and
    /// the text; for inline data it is the instruction alone.
    pub fn prompt_text(&self) -> String {
        match &self.content {
            RequestContent::InlineText { text } => {
                format!("{}{}{}", self.instruction, DOCUMENT_CONTENT_DELIMITER, text)
            }
            RequestContent::InlineData { .. } => self.instruction.clone(),
        }
    }
}

/// A failed service call. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A generative text service.
///
/// `Ok(None)` means the service answered without any text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, request: ConversionRequest) -> Result<Option<String>, ServiceError>;
}

/// [`GenerativeBackend`] over an `edgequake_llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ConversionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Lay the request out as a single user turn.
    fn messages(request: &ConversionRequest) -> Vec<ChatMessage> {
        let text = request.prompt_text();
        match &request.content {
            RequestContent::InlineData { mime_type, data } => vec![ChatMessage::user_with_images(
                &text,
                vec![ImageData::new(data.clone(), mime_type.as_str())],
            )],
            RequestContent::InlineText { .. } => vec![ChatMessage::user(&text)],
        }
    }
}

impl fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmBackend")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

#[async_trait]
impl GenerativeBackend for LlmBackend {
    async fn generate(&self, request: ConversionRequest) -> Result<Option<String>, ServiceError> {
        let messages = Self::messages(&request);
        let start = Instant::now();

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ServiceError::new(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(Some(response.content))
    }
}

/// Build `CompletionOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Sends one file's payload to the backend and interprets the answer.
#[derive(Clone)]
pub struct ConversionClient {
    backend: Arc<dyn GenerativeBackend>,
    rules: String,
}

impl ConversionClient {
    /// A client using `rules` as the conversion instruction.
    pub fn new(backend: Arc<dyn GenerativeBackend>, rules: impl Into<String>) -> Self {
        Self {
            backend,
            rules: rules.into(),
        }
    }

    /// A client using the built-in conversion rules.
    pub fn with_default_rules(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::new(backend, DEFAULT_SYSTEM_PROMPT)
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    /// Shape the request for `payload`.
    pub fn build_request(&self, payload: CanonicalPayload, original_name: &str) -> ConversionRequest {
        let content = match payload {
            CanonicalPayload::Binary { data, mime_type } => {
                RequestContent::InlineData { mime_type, data }
            }
            CanonicalPayload::Text { text } => RequestContent::InlineText { text },
        };
        ConversionRequest {
            instruction: build_instruction(&self.rules, original_name),
            content,
        }
    }

    /// Convert one payload. The returned Markdown is the service text verbatim.
    pub async fn convert(
        &self,
        payload: CanonicalPayload,
        original_name: &str,
    ) -> Result<String, PipelineError> {
        let request = self.build_request(payload, original_name);
        debug!(
            "Sending {} ({})",
            original_name,
            match &request.content {
                RequestContent::InlineData { mime_type, data } =>
                    format!("inline {mime_type}, {} base64 bytes", data.len()),
                RequestContent::InlineText { text } => format!("inline text, {} bytes", text.len()),
            }
        );

        match self.backend.generate(request).await {
            Ok(Some(text)) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(NO_CONTENT_GENERATED.to_string()),
            Err(e) => {
                warn!("Conversion of {} failed: {}", original_name, e);
                let message = if e.message.trim().is_empty() {
                    CONVERSION_FALLBACK_ERROR.to_string()
                } else {
                    e.message
                };
                Err(PipelineError::ConversionFailure { message })
            }
        }
    }
}

impl fmt::Debug for ConversionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionClient")
            .field("backend", &"<dyn GenerativeBackend>")
            .field("rules_len", &self.rules.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubBackend;
    use super::*;

    fn client(stub: &Arc<StubBackend>) -> ConversionClient {
        ConversionClient::with_default_rules(Arc::clone(stub) as Arc<dyn GenerativeBackend>)
    }

    #[tokio::test]
    async fn text_payload_goes_after_the_delimiter() {
        let stub = Arc::new(StubBackend::replying("| a | b |"));
        let md = client(&stub)
            .convert(CanonicalPayload::text("a,b\n1,2"), "data.csv")
            .await
            .unwrap();
        assert_eq!(md, "| a | b |");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let prompt = requests[0].prompt_text();
        assert!(prompt.starts_with(DEFAULT_SYSTEM_PROMPT));
        assert!(prompt.ends_with(
            "Original Filename: data.csv\n\n--- DOCUMENT CONTENT ---\n\na,b\n1,2"
        ));
    }

    #[tokio::test]
    async fn binary_payload_is_inline_data() {
        let stub = Arc::new(StubBackend::replying("# Title"));
        let payload = CanonicalPayload::Binary {
            data: "JVBERi0xLjcK".into(),
            mime_type: "application/pdf".into(),
        };
        client(&stub).convert(payload, "scan.pdf").await.unwrap();

        let request = &stub.requests()[0];
        assert_eq!(
            request.content,
            RequestContent::InlineData {
                mime_type: "application/pdf".into(),
                data: "JVBERi0xLjcK".into(),
            }
        );
        assert!(request.instruction.ends_with("Original Filename: scan.pdf"));
        assert!(!request.prompt_text().contains("DOCUMENT CONTENT"));
    }

    #[tokio::test]
    async fn missing_or_empty_answer_is_placeholder() {
        let stub = Arc::new(StubBackend::silent());
        let md = client(&stub)
            .convert(CanonicalPayload::text("x"), "a.txt")
            .await
            .unwrap();
        assert_eq!(md, "> No content generated.");

        let stub = Arc::new(StubBackend::replying(""));
        let md = client(&stub)
            .convert(CanonicalPayload::text("x"), "a.txt")
            .await
            .unwrap();
        assert_eq!(md, NO_CONTENT_GENERATED);
    }

    #[tokio::test]
    async fn service_error_message_is_kept() {
        let stub = Arc::new(StubBackend::failing("429 quota exceeded"));
        let err = client(&stub)
            .convert(CanonicalPayload::text("x"), "a.md")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::ConversionFailure {
                message: "429 quota exceeded".into()
            }
        );
    }

    #[tokio::test]
    async fn blank_service_error_uses_fallback() {
        let stub = Arc::new(StubBackend::failing(""));
        let err = client(&stub)
            .convert(CanonicalPayload::text("x"), "a.md")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), CONVERSION_FALLBACK_ERROR);
    }

    #[tokio::test]
    async fn answer_is_returned_verbatim() {
        let raw = "```markdown\n# Heading\n```\n\n";
        let stub = Arc::new(StubBackend::replying(raw));
        let md = client(&stub)
            .convert(CanonicalPayload::text("x"), "a.txt")
            .await
            .unwrap();
        assert_eq!(md, raw);
    }

    #[test]
    fn custom_rules_replace_the_default() {
        let stub = Arc::new(StubBackend::silent());
        let c = ConversionClient::new(stub as Arc<dyn GenerativeBackend>, "Be brief.");
        let req = c.build_request(CanonicalPayload::text("t"), "n.txt");
        assert_eq!(req.instruction, "Be brief.\n\nOriginal Filename: n.txt");
    }

    #[test]
    fn build_options_defaults() {
        let config = ConversionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn every_request_is_a_single_user_turn() {
        let req = ConversionRequest {
            instruction: "rules".into(),
            content: RequestContent::InlineData {
                mime_type: "application/pdf".into(),
                data: "AAAA".into(),
            },
        };
        assert_eq!(LlmBackend::messages(&req).len(), 1);
        let text = ConversionRequest {
            content: RequestContent::InlineText { text: "t".into() },
            ..req
        };
        assert_eq!(LlmBackend::messages(&text).len(), 1);
    }
}
