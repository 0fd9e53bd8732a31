use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{
    AnswerDto, AnswersResponse, AttemptResponse, RemainingTimeResponse, StartAttemptRequest,
    SubmitAnswerRequest, SubmitAnswersBatchRequest,
};
use crate::models::answer::Answer;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Json(req): Json<StartAttemptRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let attempt = state
        .attempt_service
        .start(req.student_id, req.test_id, req.course_id)
        .await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.get_attempt(attempt_id).await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let attempt = state
        .attempt_service
        .submit_answer(attempt_id, Answer::from(&req))
        .await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answers_batch(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmitAnswersBatchRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    for entry in &req.answers {
        entry.validate()?;
    }

    let answers: Vec<Answer> = req.answers.iter().map(Answer::from).collect();
    let attempt = state
        .attempt_service
        .submit_answers_batch(attempt_id, &answers)
        .await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn get_answers(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let answers = state.attempt_service.get_answers(attempt_id).await?;
    let response = AnswersResponse {
        attempt_id,
        answers: answers.into_iter().map(AnswerDto::from).collect(),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn get_remaining_time(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let (attempt, remaining_seconds) = state.attempt_service.check_remaining(attempt_id).await?;
    let response = RemainingTimeResponse {
        attempt_id: attempt.id,
        status: attempt.status,
        remaining_seconds,
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn complete_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.complete(attempt_id).await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn expire_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.expire(attempt_id).await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn report_background(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let attempt = state.attempt_service.report_background(attempt_id).await?;
    Ok(Json(AttemptResponse::from(&attempt)).into_response())
}

#[axum::debug_handler]
pub async fn report_foreground(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let (attempt, remaining_seconds) = state.attempt_service.report_foreground(attempt_id).await?;
    let response = RemainingTimeResponse {
        attempt_id: attempt.id,
        status: attempt.status,
        remaining_seconds,
    };
    Ok(Json(response).into_response())
}
