//! Hosted language model clients
//!
//! Two wire formats are supported: OpenAI-compatible chat completions and
//! Google's `generateContent`. Both return the model's raw text; parsing is
//! the caller's job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskmint_common::config::{LlmConfig, LlmProviderKind};
use tracing::debug;

use super::prompt::build_prompt;
use super::ExtractionError;

const USER_AGENT: &str = concat!("taskmint/", env!("CARGO_PKG_VERSION"));

/// A text-completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send the fixed instructions and a transcript; return the model's text
    async fn complete(&self, instructions: &str, transcript: &str)
        -> Result<String, ExtractionError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Build the configured client
pub fn build_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, ExtractionError> {
    let http_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ExtractionError::Transport(e.to_string()))?;

    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty());

    match config.provider {
        LlmProviderKind::OpenAi => Ok(Arc::new(OpenAiCompatibleClient {
            http_client,
            base_url: config.effective_base_url(),
            api_key,
            model: config.effective_model(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })),
        LlmProviderKind::Gemini => {
            let api_key = api_key.ok_or(ExtractionError::NotConfigured)?;
            Ok(Arc::new(GeminiClient {
                http_client,
                base_url: config.effective_base_url(),
                api_key,
                model: config.effective_model(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            }))
        }
    }
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

/// Any `POST {base_url}/chat/completions` endpoint (Groq, OpenAI, Ollama, ...)
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    fn request_body(&self, instructions: &str, transcript: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: instructions.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcript.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn chat_response_text(response: ChatCompletionResponse) -> Result<String, ExtractionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ExtractionError::EmptyResponse)
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    async fn complete(
        &self,
        instructions: &str,
        transcript: &str,
    ) -> Result<String, ExtractionError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, transcript_len = transcript.len(), "Querying chat completions API");

        let mut request = self
            .http_client
            .post(&url)
            .json(&self.request_body(instructions, transcript));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Transport(format!("invalid response envelope: {}", e)))?;

        chat_response_text(parsed)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

// ============================================================================
// Google Generative Language
// ============================================================================

/// `POST {base_url}/models/{model}:generateContent?key=...`
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiClient {
    fn request_body(&self, transcript: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(build_prompt(transcript)),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

fn gemini_response_text(response: GenerateContentResponse) -> Result<String, ExtractionError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(ExtractionError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(
        &self,
        _instructions: &str,
        transcript: &str,
    ) -> Result<String, ExtractionError> {
        // generateContent takes a single user turn; build_prompt embeds the
        // same fixed instructions ahead of the transcript
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(model = %self.model, transcript_len = transcript.len(), "Querying generateContent API");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(transcript))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Transport(format!("invalid response envelope: {}", e)))?;

        gemini_response_text(parsed)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn transport_error(e: reqwest::Error) -> ExtractionError {
    // reqwest includes the URL in its Display output; strip it so the
    // Gemini key query parameter never reaches the logs
    let e = e.without_url();
    if e.is_timeout() {
        ExtractionError::Transport(format!("request timed out: {}", e))
    } else {
        ExtractionError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::prompt::EXTRACTION_INSTRUCTIONS;
    use serde_json::json;

    fn openai_config() -> LlmConfig {
        LlmConfig {
            api_key: Some("key".to_string()),
            model: Some("test-model".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_build_openai_without_key() {
        let config = LlmConfig::default();
        let model = build_language_model(&config).unwrap();
        assert_eq!(model.name(), "openai-compatible");
    }

    #[test]
    fn test_build_gemini_requires_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::Gemini,
            ..LlmConfig::default()
        };
        assert!(matches!(
            build_language_model(&config),
            Err(ExtractionError::NotConfigured)
        ));
    }

    #[test]
    fn test_chat_request_shape() {
        let config = openai_config();
        let client = OpenAiCompatibleClient {
            http_client: reqwest::Client::new(),
            base_url: config.effective_base_url(),
            api_key: config.api_key.clone(),
            model: config.effective_model(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let body = serde_json::to_value(client.request_body(EXTRACTION_INSTRUCTIONS, "transcript")).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], EXTRACTION_INSTRUCTIONS);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "transcript");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_chat_response_text() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "[]"}}]
        }))
        .unwrap();
        assert_eq!(chat_response_text(response).unwrap(), "[]");

        let empty: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(chat_response_text(empty), Err(ExtractionError::EmptyResponse)));

        let null_content: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null}}]
        }))
        .unwrap();
        assert!(matches!(
            chat_response_text(null_content),
            Err(ExtractionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_gemini_request_shape() {
        let client = GeminiClient {
            http_client: reqwest::Client::new(),
            base_url: "http://localhost".to_string(),
            api_key: "k".to_string(),
            model: "gemini-pro".to_string(),
            temperature: 0.2,
            max_tokens: 512,
        };

        let body = serde_json::to_value(client.request_body("Alice: fix it")).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with(EXTRACTION_INSTRUCTIONS));
        assert!(text.ends_with("Alice: fix it"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_gemini_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "[{\"text\":"}, {"text": "\"a\"}]"}]}}]
        }))
        .unwrap();
        assert_eq!(gemini_response_text(response).unwrap(), "[{\"text\":\"a\"}]");

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert!(matches!(gemini_response_text(blocked), Err(ExtractionError::EmptyResponse)));
    }
}
