use crate::error::{Error, Result};
use crate::models::attempt::{Attempt, AttemptStatus, NewAttempt};
use crate::repositories::AttemptRepository;
use crate::services::scoring_service::ScoreOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgAttemptRepository {
    pool: PgPool,
}

impl PgAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row; `status` is stored as TEXT and parsed on the way out.
#[derive(Debug, FromRow)]
struct AttemptRow {
    id: Uuid,
    student_id: Uuid,
    test_id: Uuid,
    course_id: Uuid,
    question_count: i32,
    duration_minutes: i32,
    answers: JsonValue,
    score: Option<i32>,
    percentage: Option<i32>,
    passed: Option<bool>,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    foregrounded: bool,
    version: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AttemptRow {
    fn into_attempt(self) -> Result<Attempt> {
        Ok(Attempt {
            id: self.id,
            student_id: self.student_id,
            test_id: self.test_id,
            course_id: self.course_id,
            question_count: self.question_count,
            duration_minutes: self.duration_minutes,
            answers: self.answers,
            score: self.score,
            percentage: self.percentage,
            passed: self.passed,
            status: self.status.parse::<AttemptStatus>()?,
            started_at: self.started_at,
            completed_at: self.completed_at,
            foregrounded: self.foregrounded,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

#[async_trait]
impl AttemptRepository for PgAttemptRepository {
    async fn insert(&self, new: NewAttempt) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            INSERT INTO attempts (
                id, student_id, test_id, course_id, question_count, duration_minutes,
                answers, status, started_at, foregrounded, version
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                '[]'::jsonb, 'in_progress', $7, TRUE, 0
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.student_id)
        .bind(new.test_id)
        .bind(new.course_id)
        .bind(new.question_count)
        .bind(new.duration_minutes)
        .bind(new.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::Conflict(
                    "An in-progress attempt already exists for this student and test".to_string(),
                )
            } else {
                err.into()
            }
        })?;

        row.into_attempt()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(r#"SELECT * FROM attempts WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        row.into_attempt()
    }

    async fn find_in_progress(&self, student_id: Uuid, test_id: Uuid) -> Result<Option<Attempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM attempts
            WHERE student_id = $1 AND test_id = $2 AND status = 'in_progress'
            "#,
        )
        .bind(student_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttemptRow::into_attempt).transpose()
    }

    async fn update_answers(
        &self,
        id: Uuid,
        expected_version: i64,
        answers: &JsonValue,
    ) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE attempts
            SET answers = $1, version = version + 1, updated_at = NOW()
            WHERE id = $2 AND version = $3 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(answers)
        .bind(id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_attempt(),
            // Distinguish a stale version from a terminal record.
            None => {
                let current = self.find_by_id(id).await?;
                if current.status.is_terminal() {
                    Err(Error::InvalidState(
                        "Cannot submit answers to a completed attempt".to_string(),
                    ))
                } else {
                    Err(Error::Conflict(
                        "Attempt was modified concurrently".to_string(),
                    ))
                }
            }
        }
    }

    async fn set_foregrounded(&self, id: Uuid, foregrounded: bool) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE attempts
            SET foregrounded = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(foregrounded)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        row.into_attempt()
    }

    async fn finalize(
        &self,
        id: Uuid,
        outcome: &ScoreOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE attempts
            SET status = 'completed', score = $1, percentage = $2, passed = $3,
                completed_at = $4, updated_at = NOW()
            WHERE id = $5 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(outcome.correct_count)
        .bind(outcome.percentage)
        .bind(outcome.passed)
        .bind(completed_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_attempt(),
            None => {
                let current = self.find_by_id(id).await?;
                match current.status {
                    // Lost the race to another completion; idempotent.
                    AttemptStatus::Completed => Ok(current),
                    AttemptStatus::Expired => Err(Error::InvalidState(
                        "Attempt has expired and cannot be completed".to_string(),
                    )),
                    AttemptStatus::InProgress => Err(Error::Conflict(
                        "Attempt transitioned concurrently".to_string(),
                    )),
                }
            }
        }
    }

    async fn mark_expired(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            UPDATE attempts
            SET status = 'expired', completed_at = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(completed_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_attempt(),
            None => {
                let current = self.find_by_id(id).await?;
                Err(Error::InvalidState(format!(
                    "Cannot expire an attempt in state '{}'",
                    current.status
                )))
            }
        }
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Attempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM attempts
            WHERE status = 'in_progress'
              AND started_at + make_interval(mins => duration_minutes) <= $1
            ORDER BY started_at
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AttemptRow::into_attempt).collect()
    }
}
