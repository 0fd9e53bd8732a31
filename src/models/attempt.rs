use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Expired,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Completed | AttemptStatus::Expired)
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttemptStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "completed" => Ok(AttemptStatus::Completed),
            "expired" => Ok(AttemptStatus::Expired),
            other => Err(crate::error::Error::Internal(format!(
                "Unknown attempt status '{}'",
                other
            ))),
        }
    }
}

/// One student's timed run through one test.
///
/// `started_at` is the anchor instant: set once at creation and never
/// altered, all remaining-time computation derives from it.
/// `question_count` and `duration_minutes` are snapshotted from the catalog
/// at creation so index bounds and the deadline stay stable even if the
/// catalog row is edited mid-attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub student_id: Uuid,
    pub test_id: Uuid,
    pub course_id: Uuid,
    pub question_count: i32,
    pub duration_minutes: i32,
    /// Serialized answer entries; decode via `models::answer::decode_answers`.
    pub answers: JsonValue,
    pub score: Option<i32>,
    pub percentage: Option<i32>,
    pub passed: Option<bool>,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Foreground/background gate: answer mutation is rejected while false.
    pub foregrounded: bool,
    /// Optimistic-concurrency stamp, bumped on every answer write.
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn is_writable(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }
}

#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: Uuid,
    pub test_id: Uuid,
    pub course_id: Uuid,
    pub question_count: i32,
    pub duration_minutes: i32,
    pub started_at: DateTime<Utc>,
}
