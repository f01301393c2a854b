//! LLM Client: the single point of entry for all Gemini API calls in gymlog.
//!
//! ARCHITECTURAL RULE: No other module may call the Generative Language API directly.
//! All extraction calls MUST go through an `ExtractionBackend`.
//!
//! There is no backoff here. A failing model is substituted by the next
//! candidate in `ModelFallback`; the list is bounded and exhausted once.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response was blocked: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No extraction models configured")]
    NoModels,
}

/// A hosted text-generation model reachable by identifier.
///
/// Carried as `Arc<dyn ExtractionBackend>` so tests can substitute a canned backend.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// One-shot generation: prompt in, free text out.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. The API key never leaves this struct.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ExtractionBackend for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{GEMINI_API_BASE}/models/{model}:generateContent");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(LlmError::Blocked(reason));
        }

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: model={model}, prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

/// A prioritised list of model identifiers tried in order.
/// First success wins; if every candidate fails the last failure is returned.
#[derive(Clone)]
pub struct ModelFallback {
    backend: Arc<dyn ExtractionBackend>,
    models: Vec<String>,
}

impl ModelFallback {
    pub fn new(backend: Arc<dyn ExtractionBackend>, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Returns the answering model's identifier alongside its text.
    pub async fn generate(&self, prompt: &str) -> Result<(String, String), LlmError> {
        let mut last_error = None;

        for model in &self.models {
            match self.backend.generate(model, prompt).await {
                Ok(text) => {
                    info!("Extraction answered by {model}");
                    return Ok((model.clone(), text));
                }
                Err(e) => {
                    warn!("Extraction model {model} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::NoModels))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// Text before the opening fence and after the closing one is dropped.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    let after = after
        .strip_prefix("json")
        .or_else(|| after.strip_prefix("JSON"))
        .unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => after.trim(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"key\": \"value\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"key\": \"value\"}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(strip_json_fences(input), "[1, 2]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  [1]  ";
        assert_eq!(strip_json_fences(input), "[1]");
    }

    #[test]
    fn test_strip_json_fences_with_leading_prose() {
        let input = "Here you go:\n```json\n[1]\n```\nEnjoy!";
        assert_eq!(strip_json_fences(input), "[1]");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n[1]";
        assert_eq!(strip_json_fences(input), "[1]");
    }

    #[test]
    fn test_response_text_joins_parts_of_first_candidate() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[{\"a\":"}, {"text": "1}]"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("[{\"a\":1}]"));
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 10);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.text().is_none());
        assert_eq!(
            parsed.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[tokio::test]
    async fn test_fallback_first_success_wins() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with_failure("models/a", 503, "overloaded")
                .with_answer("models/b", "B")
                .with_answer("models/c", "C"),
        );
        let fallback = ModelFallback::new(
            backend.clone(),
            vec!["models/a".into(), "models/b".into(), "models/c".into()],
        );

        let (model, text) = fallback.generate("prompt").await.unwrap();
        assert_eq!(model, "models/b");
        assert_eq!(text, "B");
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["models/a".to_string(), "models/b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fallback_returns_last_error_when_exhausted() {
        let backend = Arc::new(
            ScriptedBackend::default()
                .with_failure("models/a", 503, "overloaded")
                .with_failure("models/b", 400, "bad key"),
        );
        let fallback =
            ModelFallback::new(backend.clone(), vec!["models/a".into(), "models/b".into()]);

        let err = fallback.generate("prompt").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fallback_with_no_models() {
        let fallback = ModelFallback::new(Arc::new(ScriptedBackend::default()), vec![]);
        assert!(matches!(
            fallback.generate("prompt").await,
            Err(LlmError::NoModels)
        ));
    }
}
