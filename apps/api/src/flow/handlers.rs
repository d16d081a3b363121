//! Axum route handlers for the AI flow: next question → recommend → roadmap.

use axum::{extract::State, Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::advisor::models::{
    DynamicQuestion, RecommendationSet, RoadmapPlan, UniversityRecommendation,
};
use crate::advisor::prompts::{next_question_prompt, recommendation_prompt, roadmap_prompt};
use crate::errors::AppError;
use crate::flow::state::{require_questions_complete, require_recommendations, FlowState};
use crate::profile::handlers::load_profile;
use crate::profile::models::ProfilePatch;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionRequest {
    pub student_id: Option<String>,
    /// Answer to the previously asked question, if any.
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapRequest {
    pub student_id: Option<String>,
    /// Used only when the profile has no stored recommendations.
    #[serde(default)]
    pub recommendations: Option<Vec<UniversityRecommendation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NextQuestionResponse {
    Completed { completed: bool, message: String },
    Question(DynamicQuestion),
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/next-question
///
/// Logs the supplied answer, then either reports the questionnaire as
/// complete or asks the provider for one more question.
pub async fn handle_next_question(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    let request: NextQuestionRequest = parse_request(body)?;
    let id = require_student_id(request.student_id)?;
    let mut profile = load_profile(&state, &id).await?;

    if let Some(answer) = request.answer.filter(|a| !a.trim().is_empty()) {
        let mut answers = profile.answers.clone();
        answers.push(answer);
        profile = state
            .store
            .upsert(&id, patch([("answers", json!(answers))]))
            .await?;
    }

    let flow = FlowState::of(&profile);
    if flow.questions_complete() {
        if !profile.questions_completed {
            state
                .store
                .upsert(&id, patch([("questions_completed", json!(true))]))
                .await?;
        }
        info!("Questionnaire complete for {id} ({flow})");
        return Ok(Json(NextQuestionResponse::Completed {
            completed: true,
            message: "Questionnaire completed. Proceed to recommendations.".to_string(),
        }));
    }

    let value = state.gateway.generate(&next_question_prompt(&profile)).await?;
    let question: DynamicQuestion = shaped(value, "question")?;

    let asked = profile.question_count + 1;
    state
        .store
        .upsert(&id, patch([("question_count", json!(asked))]))
        .await?;
    info!("Asked dynamic question {asked} for {id}");

    Ok(Json(NextQuestionResponse::Question(question)))
}

/// POST /api/ai/recommend
///
/// Guarded: the question phase must be complete.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<RecommendationSet>, AppError> {
    let request: RecommendRequest = parse_request(body)?;
    let id = require_student_id(request.student_id)?;
    let profile = load_profile(&state, &id).await?;
    let flow = FlowState::of(&profile);
    require_questions_complete(flow)?;

    info!("Generating recommendations for {id} ({flow})");
    let value = state.gateway.generate(&recommendation_prompt(&profile)).await?;
    let set: RecommendationSet = shaped(value, "recommendation set")?;

    let recommendations = set.recommendations.clone().ok_or_else(|| {
        AppError::GenerationShape(
            "AI failed to generate recommendations. Please try again.".to_string(),
        )
    })?;

    state
        .store
        .upsert(
            &id,
            patch([
                ("lastRecommendations", json!(recommendations)),
                ("questions_completed", json!(true)),
            ]),
        )
        .await?;
    info!(
        "Stored {} recommendations for {id}",
        recommendations.len()
    );

    Ok(Json(set))
}

/// POST /api/ai/roadmap
///
/// Guarded: needs stored recommendations or ones supplied in the body.
pub async fn handle_roadmap(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<RoadmapPlan>, AppError> {
    let request: RoadmapRequest = parse_request(body)?;
    let id = require_student_id(request.student_id)?;
    let profile = load_profile(&state, &id).await?;
    let recommendations = require_recommendations(&profile, request.recommendations)?;

    info!("Generating roadmap for {id} ({})", FlowState::of(&profile));
    let value = state
        .gateway
        .generate(&roadmap_prompt(&profile, &recommendations))
        .await?;
    let plan: RoadmapPlan = shaped(value, "roadmap")?;

    state
        .store
        .upsert(&id, patch([("report_generated", json!(true))]))
        .await?;
    info!("Roadmap with {} phases generated for {id}", plan.roadmap.len());

    Ok(Json(plan))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads a request body, rejecting mistyped fields with a 400.
fn parse_request<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn require_student_id(student_id: Option<String>) -> Result<String, AppError> {
    student_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("studentId is required".to_string()))
}

fn patch<const N: usize>(fields: [(&str, Value); N]) -> ProfilePatch {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Reads a provider reply into the expected payload type.
fn shaped<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::GenerationShape(format!("AI returned a malformed {what}: {e}")))
}
