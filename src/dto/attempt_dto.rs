use crate::models::answer::Answer;
use crate::models::attempt::{Attempt, AttemptStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartAttemptRequest {
    pub student_id: Uuid,
    pub test_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_index: u32,
    /// -1 clears the selection ("not yet answered").
    #[validate(range(min = -1))]
    pub selected_option: i32,
    #[serde(default)]
    pub marked_for_review: bool,
}

impl From<&SubmitAnswerRequest> for Answer {
    fn from(req: &SubmitAnswerRequest) -> Self {
        Answer {
            question_index: req.question_index,
            selected_option: req.selected_option,
            marked_for_review: req.marked_for_review,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswersBatchRequest {
    #[validate(length(min = 1, message = "answer batch must not be empty"))]
    pub answers: Vec<SubmitAnswerRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDto {
    pub question_index: u32,
    pub selected_option: i32,
    pub marked_for_review: bool,
}

impl From<Answer> for AnswerDto {
    fn from(a: Answer) -> Self {
        Self {
            question_index: a.question_index,
            selected_option: a.selected_option,
            marked_for_review: a.marked_for_review,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub test_id: Uuid,
    pub course_id: Uuid,
    pub status: AttemptStatus,
    pub question_count: i32,
    pub duration_minutes: i32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub percentage: Option<i32>,
    pub passed: Option<bool>,
    pub foregrounded: bool,
    pub answers: Vec<AnswerDto>,
}

impl From<&Attempt> for AttemptResponse {
    fn from(attempt: &Attempt) -> Self {
        Self {
            id: attempt.id,
            student_id: attempt.student_id,
            test_id: attempt.test_id,
            course_id: attempt.course_id,
            status: attempt.status,
            question_count: attempt.question_count,
            duration_minutes: attempt.duration_minutes,
            started_at: attempt.started_at,
            completed_at: attempt.completed_at,
            score: attempt.score,
            percentage: attempt.percentage,
            passed: attempt.passed,
            foregrounded: attempt.foregrounded,
            answers: crate::models::answer::decode_answers(&attempt.answers)
                .into_iter()
                .map(AnswerDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersResponse {
    pub attempt_id: Uuid,
    pub answers: Vec<AnswerDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemainingTimeResponse {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub remaining_seconds: i64,
}
