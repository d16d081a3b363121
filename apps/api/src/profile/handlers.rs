//! Axum route handlers for the Profile API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::profile::models::{CreateProfileRequest, ProfilePatch, StudentProfile};
use crate::state::AppState;

/// Fetches a profile or fails with `NotFound`.
pub async fn load_profile(state: &AppState, id: &str) -> Result<StudentProfile, AppError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No profile found with ID {id}")))
}

/// POST /api/student/profile
///
/// Validates the static intake payload and stores it. Re-posting an existing
/// id merges into the stored record rather than resetting its progress.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<StudentProfile>), AppError> {
    let request = CreateProfileRequest::from_json(body)?;
    let id = request.id.clone();
    let profile = state.store.upsert(&id, request.into_patch()?).await?;
    info!("Stored profile {id}");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PATCH /api/student/profile/:id
///
/// Shallow merge; fields absent from the body are left untouched.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<StudentProfile>, AppError> {
    let patch: ProfilePatch = match body {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Validation(
                "profile update must be a JSON object".to_string(),
            ))
        }
    };
    load_profile(&state, &id).await?;
    let profile = state.store.upsert(&id, patch).await?;
    Ok(Json(profile))
}

/// GET /api/student/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentProfile>, AppError> {
    Ok(Json(load_profile(&state, &id).await?))
}
