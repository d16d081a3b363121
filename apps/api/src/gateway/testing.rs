//! Stub text generators for tests (no real API calls).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{LlmError, TextGenerator};

/// Replays a fixed script of replies, then repeats the fallback (if any).
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<String>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Always answers with the same reply. Errors are repeated as a 429 when
    /// rate-limited, otherwise as a 500.
    pub fn repeating(reply: Result<String, LlmError>) -> Self {
        match reply {
            Ok(text) => Self {
                script: Mutex::new(VecDeque::new()),
                fallback: Some(text),
                calls: AtomicU32::new(0),
            },
            Err(e) => {
                let status = if e.is_rate_limited() { 429 } else { 500 };
                let message = e.to_string();
                let script = (0..64)
                    .map(|_| {
                        Err(LlmError::Api {
                            status,
                            message: message.clone(),
                        })
                    })
                    .collect();
                Self::new(script)
            }
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(LlmError::EmptyContent),
        }
    }
}

pub const QUESTION_REPLY: &str =
    r#"{"question": "Which area of AI excites you most?", "reason": "Narrows program focus"}"#;

pub const RECOMMENDATION_REPLY: &str = r#"{
  "summary": "- **Strong fit** for applied AI programs",
  "recommendations": [
    {
      "country": "Germany",
      "university": "TU Munich",
      "major": "Informatics",
      "ranking": 37,
      "tuition_fees": "$3k/year",
      "why_this_choice": "- **Low tuition** with strong AI labs",
      "risk_flags": ["German residence permit timeline"],
      "admission_probability": "Medium"
    }
  ],
  "top_scholarships": [
    {"name": "DAAD", "amount": "$1,000/month", "deadline": "October", "eligibility": "Strong academics"}
  ],
  "risks": ["Competitive admissions"],
  "alternatives": ["Applied sciences university"]
}"#;

pub const ROADMAP_REPLY: &str = r#"{
  "roadmap": [
    {
      "phase": "Month 1-3: Foundation",
      "description": "Prepare language tests.",
      "actions": ["Book **IELTS**"],
      "exams": ["IELTS"],
      "skills_to_learn": ["Linear algebra"],
      "cost_estimate": "**$250 USD**",
      "timeline": "Month 1-3"
    }
  ]
}"#;

/// Answers each advisor prompt kind with a canned, well-formed reply.
#[derive(Default)]
pub struct CannedAdvisor {
    calls: AtomicU32,
}

impl CannedAdvisor {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CannedAdvisor {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.contains("\"roadmap\"") {
            ROADMAP_REPLY
        } else if prompt.contains("\"recommendations\"") {
            RECOMMENDATION_REPLY
        } else {
            QUESTION_REPLY
        };
        Ok(reply.to_string())
    }
}
