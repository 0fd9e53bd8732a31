pub mod attempt;
pub mod health;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Full route table. Tests drive this router directly with
/// `tower::ServiceExt::oneshot`; `main` wraps it in trace/CORS layers.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/attempts/start", post(attempt::start_attempt))
        .route("/api/attempts/:id", get(attempt::get_attempt))
        .route(
            "/api/attempts/:id/answers",
            get(attempt::get_answers).post(attempt::submit_answer),
        )
        .route(
            "/api/attempts/:id/answers/batch",
            post(attempt::submit_answers_batch),
        )
        .route(
            "/api/attempts/:id/remaining",
            get(attempt::get_remaining_time),
        )
        .route("/api/attempts/:id/complete", post(attempt::complete_attempt))
        .route("/api/attempts/:id/expire", post(attempt::expire_attempt))
        .route(
            "/api/attempts/:id/background",
            post(attempt::report_background),
        )
        .route(
            "/api/attempts/:id/foreground",
            post(attempt::report_foreground),
        )
        .with_state(state)
}
