pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::flow::handlers as flow;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile API
        .route("/api/student/profile", post(profile::handle_create_profile))
        .route(
            "/api/student/profile/:id",
            patch(profile::handle_update_profile),
        )
        .route("/api/student/:id", get(profile::handle_get_profile))
        // AI flow API
        .route("/api/ai/next-question", post(flow::handle_next_question))
        .route("/api/ai/recommend", post(flow::handle_recommend))
        .route("/api/ai/roadmap", post(flow::handle_roadmap))
        .with_state(state)
}
