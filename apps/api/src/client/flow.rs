//! Questionnaire state machine: static intake → AI follow-ups → generation → results.
//!
//! Every backend call is awaited before the flow advances, so at most one
//! request per profile is ever in flight.

use std::time::Duration;

use rand::Rng;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::advisor::models::{DynamicQuestion, RecommendationSet, RoadmapPlan};
use crate::client::api::{ClientError, FlowBackend};
use crate::client::questions::{profile_body, FieldError, StaticQuestion, STATIC_QUESTIONS};
use crate::flow::handlers::NextQuestionResponse;
use crate::flow::state::QUESTION_BUDGET;

/// Minimum time the generating screen stays up, independent of network latency.
pub const MIN_GENERATION_DELAY: Duration = Duration::from_secs(3);

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq)]
pub struct FlowResults {
    pub recommendations: RecommendationSet,
    pub roadmap: RoadmapPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Index into `STATIC_QUESTIONS`.
    StaticStep(usize),
    /// 1-based dynamic question number.
    DynamicStep(u32),
    Generating,
    Results(Box<FlowResults>),
    /// Terminal: provider quota exhausted.
    ServiceBusy,
    /// Error variant of the results view; `retry` replays the failed step.
    Failed(String),
}

/// The backend step that moved the flow to `Failed`, replayed by `retry`.
#[derive(Debug, Clone, PartialEq)]
enum FailedStep {
    Create { id: String },
    SaveAnswer { asked: u32, answer: String },
    NextQuestion { asked: u32, answer: Option<String> },
    Generate,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Results(_) | Self::ServiceBusy | Self::Failed(_))
    }
}

pub struct QuestionnaireFlow<B: FlowBackend> {
    backend: B,
    phase: Phase,
    answers: Map<String, Value>,
    profile_id: Option<String>,
    question: Option<DynamicQuestion>,
    transcript: String,
    dynamic_budget: u32,
    min_delay: Duration,
    failed_step: Option<FailedStep>,
}

impl<B: FlowBackend> QuestionnaireFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            phase: Phase::StaticStep(0),
            answers: Map::new(),
            profile_id: None,
            question: None,
            transcript: String::new(),
            dynamic_budget: QUESTION_BUDGET,
            min_delay: MIN_GENERATION_DELAY,
            failed_step: None,
        }
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn profile_id(&self) -> Option<&str> {
        self.profile_id.as_deref()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// The static question currently on screen, if any.
    pub fn static_question(&self) -> Option<&'static StaticQuestion> {
        match self.phase {
            Phase::StaticStep(i) => STATIC_QUESTIONS.get(i),
            _ => None,
        }
    }

    /// The AI question currently on screen, if any.
    pub fn dynamic_question(&self) -> Option<&DynamicQuestion> {
        match self.phase {
            Phase::DynamicStep(_) => self.question.as_ref(),
            _ => None,
        }
    }

    /// Feeds one answer into the current step.
    ///
    /// Validation problems leave the flow on the same step. Backend failures
    /// never surface here; they move the flow to `ServiceBusy` or `Failed`.
    pub async fn submit(&mut self, input: &str) -> Result<(), FieldError> {
        match self.phase.clone() {
            Phase::StaticStep(i) => self.submit_static(i, input).await,
            Phase::DynamicStep(j) => self.submit_dynamic(j, input).await,
            _ => Ok(()),
        }
    }

    /// Re-runs the backend step that failed, resuming the flow from there.
    pub async fn retry(&mut self) {
        if !matches!(self.phase, Phase::Failed(_)) {
            return;
        }
        let Some(step) = self.failed_step.take() else {
            return;
        };
        info!("Retrying {step:?}");
        match step {
            FailedStep::Create { id } => self.create(id).await,
            FailedStep::SaveAnswer { asked, answer } => self.save_answer(asked, &answer).await,
            FailedStep::NextQuestion { asked, answer } => {
                self.advance(answer.as_deref(), asked).await
            }
            FailedStep::Generate => self.generate().await,
        }
    }

    async fn submit_static(&mut self, i: usize, input: &str) -> Result<(), FieldError> {
        let Some(question) = STATIC_QUESTIONS.get(i) else {
            return Ok(());
        };
        let value = question.parse(input)?;
        self.answers.insert(question.key.to_string(), value);

        if i + 1 < STATIC_QUESTIONS.len() {
            self.phase = Phase::StaticStep(i + 1);
            return Ok(());
        }

        self.create(synthesize_id()).await;
        Ok(())
    }

    /// Submits the static answers under `id`; a retry reuses the same id.
    async fn create(&mut self, id: String) {
        info!("Submitting profile {id}");
        if let Err(e) = self.backend.create_profile(&profile_body(&id, &self.answers)).await {
            self.divert(e, FailedStep::Create { id });
            return;
        }
        self.profile_id = Some(id);
        self.advance(None, 0).await;
    }

    async fn submit_dynamic(&mut self, j: u32, input: &str) -> Result<(), FieldError> {
        let answer = input.trim();
        if answer.is_empty() {
            return Err(FieldError::new("answer", "please type an answer"));
        }
        let Some(question) = self.question.clone() else {
            return Ok(());
        };

        self.transcript
            .push_str(&format!("\nQ: {}\nA: {}", question.question, answer));
        self.save_answer(j, answer).await;
        Ok(())
    }

    /// Sends the whole transcript, then asks for the next question.
    async fn save_answer(&mut self, asked: u32, answer: &str) {
        let Some(id) = self.profile_id.clone() else {
            return;
        };
        let patch = json!({"additional_info": self.transcript});
        if let Err(e) = self.backend.update_profile(&id, &patch).await {
            let step = FailedStep::SaveAnswer {
                asked,
                answer: answer.to_string(),
            };
            self.divert(e, step);
            return;
        }
        self.advance(Some(answer), asked).await;
    }

    /// Asks the server for the next question after `asked` questions.
    async fn advance(&mut self, answer: Option<&str>, asked: u32) {
        let Some(id) = self.profile_id.clone() else {
            return;
        };
        match self.backend.next_question(&id, answer).await {
            Ok(NextQuestionResponse::Question(q)) if asked < self.dynamic_budget => {
                self.question = Some(q);
                self.phase = Phase::DynamicStep(asked + 1);
            }
            Ok(_) => self.generate().await,
            Err(e) => {
                let step = FailedStep::NextQuestion {
                    asked,
                    answer: answer.map(str::to_string),
                };
                self.divert(e, step);
            }
        }
    }

    /// Recommend then roadmap, sequentially, while the delay floor runs alongside.
    async fn generate(&mut self) {
        let Some(id) = self.profile_id.clone() else {
            return;
        };
        self.phase = Phase::Generating;
        self.question = None;

        let backend = &self.backend;
        let work = async {
            let recommendations = backend.recommend(&id).await?;
            let roadmap = backend.roadmap(&id).await?;
            Ok::<_, ClientError>(FlowResults {
                recommendations,
                roadmap,
            })
        };
        let (result, _) = tokio::join!(work, tokio::time::sleep(self.min_delay));

        match result {
            Ok(results) => {
                info!("Results ready for {id}");
                self.phase = Phase::Results(Box::new(results));
            }
            Err(e) => self.divert(e, FailedStep::Generate),
        }
    }

    fn divert(&mut self, err: ClientError, step: FailedStep) {
        warn!("Questionnaire flow stopped at {step:?}: {err}");
        self.phase = match err {
            ClientError::ServiceBusy(_) => Phase::ServiceBusy,
            other => {
                self.failed_step = Some(step);
                Phase::Failed(other.to_string())
            }
        };
    }
}

/// `student_` followed by 9 random base-36 characters.
pub fn synthesize_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("student_{suffix}")
}
