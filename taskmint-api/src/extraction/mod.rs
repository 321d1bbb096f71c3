//! Transcript-to-task extraction
//!
//! Validates the transcript, sends it to the configured language model with
//! the fixed instruction template, and parses the answer into [`NewTask`]s.
//! Either the whole answer is usable or the call fails: no retry, no
//! partial result.

pub mod llm;
pub mod parser;
pub mod prompt;

pub use llm::{build_language_model, LanguageModel};
pub use parser::parse_model_output;
pub use prompt::EXTRACTION_INSTRUCTIONS;

use taskmint_common::NewTask;
use thiserror::Error;
use tracing::{info, warn};

/// Extraction failures
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Transcript is required")]
    EmptyTranscript,

    #[error("Language model not configured (missing API key)")]
    NotConfigured,

    #[error("Model request failed: {0}")]
    Transport(String),

    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Malformed model output: {0}")]
    MalformedResponse(String),

    #[error("Invalid task at index {index}: {reason}")]
    InvalidTask { index: usize, reason: String },

    #[error("Model returned no action items")]
    NoTasks,
}

/// Extract action items from a transcript
pub async fn extract_tasks(
    model: &dyn LanguageModel,
    transcript: &str,
) -> Result<Vec<NewTask>, ExtractionError> {
    if transcript.trim().is_empty() {
        return Err(ExtractionError::EmptyTranscript);
    }

    let raw = model.complete(EXTRACTION_INSTRUCTIONS, transcript).await?;

    let tasks = parse_model_output(&raw).map_err(|e| {
        warn!(
            provider = model.name(),
            error = %e,
            response_len = raw.len(),
            "Rejected model output"
        );
        e
    })?;

    info!(provider = model.name(), tasks = tasks.len(), "Extracted action items");

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskmint_common::Priority;

    struct FixedModel {
        answer: &'static str,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(answer: &'static str) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, instructions: &str, _transcript: &str) -> Result<String, ExtractionError> {
            assert_eq!(instructions, EXTRACTION_INSTRUCTIONS);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct DownModel;

    #[async_trait]
    impl LanguageModel for DownModel {
        async fn complete(&self, _: &str, _: &str) -> Result<String, ExtractionError> {
            Err(ExtractionError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_blank_transcript_skips_model() {
        let model = FixedModel::new("[]");
        let result = extract_tasks(&model, "   \n ").await;

        assert!(matches!(result, Err(ExtractionError::EmptyTranscript)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_meeting_scenario() {
        let model = FixedModel::new(
            r#"[{"text":"Alice: fix the login bug by Friday","priority":"high","tags":["Engineering"]},
                {"text":"Bob: update the style guide","priority":"low"}]"#,
        );
        let tasks = extract_tasks(
            &model,
            "Alice will fix the login bug by Friday. Bob should eventually update the style guide.",
        )
        .await
        .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].priority, Priority::Low);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prose_answer_fails() {
        let model = FixedModel::new("I could not find any action items.");
        let result = extract_tasks(&model, "small talk only").await;
        assert!(matches!(result, Err(ExtractionError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let result = extract_tasks(&DownModel, "Ship it").await;
        assert!(matches!(result, Err(ExtractionError::Transport(_))));
    }
}
