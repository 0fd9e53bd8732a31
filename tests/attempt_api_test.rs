mod support;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use exam_attempt_backend::dto::attempt_dto::{
    AnswersResponse, AttemptResponse, RemainingTimeResponse,
};
use exam_attempt_backend::{routes, AppState};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

fn app(exam: &support::TestExam) -> axum::Router {
    routes::app_router(AppState::new(exam.service.clone()))
}

fn request(method: Method, uri: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_attempt_flow_over_http() {
    let exam = support::TestExam::new(60, 33, &[1, 0, 2]);
    let app = app(&exam);

    // Start
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/attempts/start",
            Some(json!({
                "student_id": Uuid::new_v4(),
                "test_id": Uuid::new_v4(),
                "course_id": Uuid::new_v4(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let attempt: AttemptResponse = json_body(response).await;
    assert_eq!(attempt.question_count, 3);

    // Answer two questions, one via the batch endpoint
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers", attempt.id),
            Some(json!({"question_index": 0, "selected_option": 1})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers/batch", attempt.id),
            Some(json!({
                "answers": [
                    {"question_index": 1, "selected_option": 1, "marked_for_review": true}
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Remaining time comes from the anchor
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attempts/{}/remaining", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remaining: RemainingTimeResponse = json_body(response).await;
    assert_eq!(remaining.remaining_seconds, 3600);

    // Complete and check the scored result
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/complete", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let completed: AttemptResponse = json_body(response).await;
    assert_eq!(completed.score, Some(1));
    assert_eq!(completed.percentage, Some(33));
    assert_eq!(completed.passed, Some(true));

    // Mutation after completion is a conflict the UI can recognize
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers", attempt.id),
            Some(json!({"question_index": 2, "selected_option": 0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: JsonValue = json_body(response).await;
    assert_eq!(error["kind"], "invalid_state");

    // Stored answers are still readable post-terminal
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attempts/{}/answers", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let answers: AnswersResponse = json_body(response).await;
    assert_eq!(answers.answers.len(), 2);
}

#[tokio::test]
async fn background_gate_is_enforced_at_the_http_boundary() {
    let exam = support::TestExam::new(60, 50, &[1, 0, 2]);
    let app = app(&exam);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/attempts/start",
            Some(json!({
                "student_id": Uuid::new_v4(),
                "test_id": Uuid::new_v4(),
                "course_id": Uuid::new_v4(),
            })),
        ))
        .await
        .unwrap();
    let attempt: AttemptResponse = json_body(response).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/background", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers", attempt.id),
            Some(json!({"question_index": 0, "selected_option": 1})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Foreground return reconciles remaining time and re-enables writes
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/foreground", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remaining: RemainingTimeResponse = json_body(response).await;
    assert_eq!(remaining.remaining_seconds, 3600);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers", attempt.id),
            Some(json!({"question_index": 0, "selected_option": 1})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn validation_and_missing_attempts_map_to_client_errors() {
    let exam = support::TestExam::new(60, 50, &[1]);
    let app = app(&exam);

    // Unknown attempt id
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attempts/{}", Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: JsonValue = json_body(response).await;
    assert_eq!(error["kind"], "not_found");

    // Empty batch fails validation
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/attempts/start",
            Some(json!({
                "student_id": Uuid::new_v4(),
                "test_id": Uuid::new_v4(),
                "course_id": Uuid::new_v4(),
            })),
        ))
        .await
        .unwrap();
    let attempt: AttemptResponse = json_body(response).await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers/batch", attempt.id),
            Some(json!({"answers": []})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Out-of-range question index is a caller bug, reported loudly
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attempts/{}/answers", attempt.id),
            Some(json!({"question_index": 5, "selected_option": 0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: JsonValue = json_body(response).await;
    assert_eq!(error["kind"], "bad_request");
}

#[tokio::test]
async fn expired_attempt_reports_zero_remaining_over_http() {
    let exam = support::TestExam::new(60, 33, &[1, 0, 2]);
    let app = app(&exam);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/attempts/start",
            Some(json!({
                "student_id": Uuid::new_v4(),
                "test_id": Uuid::new_v4(),
                "course_id": Uuid::new_v4(),
            })),
        ))
        .await
        .unwrap();
    let attempt: AttemptResponse = json_body(response).await;

    exam.clock.advance_minutes(61);

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attempts/{}/remaining", attempt.id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remaining: RemainingTimeResponse = json_body(response).await;
    assert_eq!(remaining.remaining_seconds, 0);

    // The poll that observed zero also finalized the attempt with a score.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attempts/{}", attempt.id),
            None,
        ))
        .await
        .unwrap();
    let finalized: AttemptResponse = json_body(response).await;
    assert_eq!(
        finalized.status,
        exam_attempt_backend::models::attempt::AttemptStatus::Completed
    );
    assert_eq!(finalized.score, Some(0));
    assert_eq!(finalized.passed, Some(false));
}
