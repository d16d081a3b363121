//! AI Gateway: turns a prompt into parsed JSON, retrying transient failures.
//!
//! The gateway is stateless and knows nothing about profiles. A response that
//! is not valid JSON counts as a failed attempt, exactly like a transport or
//! provider error.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::{strip_json_fences, LlmError, TextGenerator};

pub mod retry;

#[cfg(test)]
pub mod testing;

use retry::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider quota exceeded after {attempts} attempts: {message}")]
    QuotaExceeded { attempts: u32, message: String },

    #[error("generation failed after {attempts} attempts: {message}")]
    Failure { attempts: u32, message: String },
}

/// Why a single gateway attempt failed.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("invalid JSON response from provider: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AttemptError {
    fn is_rate_limited(&self) -> bool {
        match self {
            AttemptError::Provider(e) => {
                e.is_rate_limited() || has_rate_limit_signature(&e.to_string())
            }
            AttemptError::Parse(_) => false,
        }
    }
}

/// Textual rate-limit markers used by the provider and intermediate proxies.
fn has_rate_limit_signature(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("429")
        || message.contains("RESOURCE_EXHAUSTED")
        || lower.contains("too many requests")
        || lower.contains("quota")
}

#[derive(Clone)]
pub struct AiGateway {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl AiGateway {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    /// Sends `prompt` to the provider and parses the reply as JSON.
    pub async fn generate(&self, prompt: &str) -> Result<Value, GenerationError> {
        let value = retry_with_backoff(
            &self.policy,
            |attempt| async move {
                debug!("Generation attempt {attempt}");
                let text = self.generator.generate_text(prompt).await?;
                let parsed = serde_json::from_str::<Value>(strip_json_fences(&text))?;
                Ok::<_, AttemptError>(parsed)
            },
            AttemptError::is_rate_limited,
        )
        .await?;

        info!("Generation succeeded ({} prompt chars)", prompt.len());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;
    use std::time::Duration;

    fn gateway(generator: Arc<ScriptedGenerator>, attempts: u32) -> AiGateway {
        AiGateway::new(
            generator,
            RetryPolicy::new(attempts, Duration::from_millis(10)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_parses_json_reply() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            r#"{"question": "Why CS?", "reason": "clarity"}"#.to_string(),
        )]));
        let value = gateway(generator.clone(), 3).generate("p").await.unwrap();
        assert_eq!(value["question"], "Why CS?");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strips_code_fences_before_parsing() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "```json\n{\"ok\": true}\n```".to_string(),
        )]));
        let value = gateway(generator, 3).generate("p").await.unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_json_retried_to_exact_ceiling() {
        let generator = Arc::new(ScriptedGenerator::repeating(Ok(
            "Sure! Here is your answer.".to_string(),
        )));
        let err = gateway(generator.clone(), 3).generate("p").await.unwrap_err();
        assert_eq!(generator.calls(), 3);
        assert!(matches!(err, GenerationError::Failure { attempts: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_failure_then_success() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("not json".to_string()),
            Ok(r#"{"recommendations": []}"#.to_string()),
        ]));
        let value = gateway(generator.clone(), 3).generate("p").await.unwrap();
        assert!(value["recommendations"].is_array());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_on_final_attempt_is_quota() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(LlmError::Api {
                status: 500,
                message: "internal".into(),
            }),
            Ok("garbage".to_string()),
            Err(LlmError::Api {
                status: 429,
                message: "Too Many Requests".into(),
            }),
        ]));
        let err = gateway(generator, 3).generate("p").await.unwrap_err();
        assert!(matches!(err, GenerationError::QuotaExceeded { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_error_on_final_attempt_is_failure() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(LlmError::Api {
                status: 429,
                message: "Too Many Requests".into(),
            }),
            Err(LlmError::Api {
                status: 503,
                message: "unavailable".into(),
            }),
        ]));
        let err = gateway(generator, 2).generate("p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Failure { .. }));
    }

    #[test]
    fn test_rate_limit_signature() {
        assert!(has_rate_limit_signature("[429 Too Many Requests] slow down"));
        assert!(has_rate_limit_signature("You exceeded your current quota"));
        assert!(!has_rate_limit_signature("connection reset by peer"));
    }
}
