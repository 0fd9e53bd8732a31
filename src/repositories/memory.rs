use crate::error::{Error, Result};
use crate::models::attempt::{Attempt, AttemptStatus, NewAttempt};
use crate::repositories::AttemptRepository;
use crate::services::scoring_service::ScoreOutcome;
use crate::services::timer_service;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory attempt store with the same transition and CAS semantics as
/// the Postgres repository. Backs the test suite and local development.
#[derive(Clone, Default)]
pub struct MemoryAttemptRepository {
    inner: Arc<RwLock<HashMap<Uuid, Attempt>>>,
}

impl MemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for MemoryAttemptRepository {
    async fn insert(&self, new: NewAttempt) -> Result<Attempt> {
        let mut attempts = self.inner.write().await;

        let already_live = attempts.values().any(|a| {
            a.student_id == new.student_id
                && a.test_id == new.test_id
                && a.status == AttemptStatus::InProgress
        });
        if already_live {
            return Err(Error::Conflict(
                "An in-progress attempt already exists for this student and test".to_string(),
            ));
        }

        let attempt = Attempt {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            test_id: new.test_id,
            course_id: new.course_id,
            question_count: new.question_count,
            duration_minutes: new.duration_minutes,
            answers: JsonValue::Array(Vec::new()),
            score: None,
            percentage: None,
            passed: None,
            status: AttemptStatus::InProgress,
            started_at: new.started_at,
            completed_at: None,
            foregrounded: true,
            version: 0,
            created_at: Some(new.started_at),
            updated_at: Some(new.started_at),
        };
        attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Attempt> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }

    async fn find_in_progress(&self, student_id: Uuid, test_id: Uuid) -> Result<Option<Attempt>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .find(|a| {
                a.student_id == student_id
                    && a.test_id == test_id
                    && a.status == AttemptStatus::InProgress
            })
            .cloned())
    }

    async fn update_answers(
        &self,
        id: Uuid,
        expected_version: i64,
        answers: &JsonValue,
    ) -> Result<Attempt> {
        let mut attempts = self.inner.write().await;
        let attempt = attempts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        if attempt.status.is_terminal() {
            return Err(Error::InvalidState(
                "Cannot submit answers to a completed attempt".to_string(),
            ));
        }
        if attempt.version != expected_version {
            return Err(Error::Conflict(
                "Attempt was modified concurrently".to_string(),
            ));
        }

        attempt.answers = answers.clone();
        attempt.version += 1;
        attempt.updated_at = Some(Utc::now());
        Ok(attempt.clone())
    }

    async fn set_foregrounded(&self, id: Uuid, foregrounded: bool) -> Result<Attempt> {
        let mut attempts = self.inner.write().await;
        let attempt = attempts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        attempt.foregrounded = foregrounded;
        attempt.updated_at = Some(Utc::now());
        Ok(attempt.clone())
    }

    async fn finalize(
        &self,
        id: Uuid,
        outcome: &ScoreOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt> {
        let mut attempts = self.inner.write().await;
        let attempt = attempts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        match attempt.status {
            AttemptStatus::Completed => Ok(attempt.clone()),
            AttemptStatus::Expired => Err(Error::InvalidState(
                "Attempt has expired and cannot be completed".to_string(),
            )),
            AttemptStatus::InProgress => {
                attempt.status = AttemptStatus::Completed;
                attempt.score = Some(outcome.correct_count);
                attempt.percentage = Some(outcome.percentage);
                attempt.passed = Some(outcome.passed);
                attempt.completed_at = Some(completed_at);
                attempt.updated_at = Some(completed_at);
                Ok(attempt.clone())
            }
        }
    }

    async fn mark_expired(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<Attempt> {
        let mut attempts = self.inner.write().await;
        let attempt = attempts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))?;

        if attempt.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "Cannot expire an attempt in state '{}'",
                attempt.status
            )));
        }

        attempt.status = AttemptStatus::Expired;
        attempt.completed_at = Some(completed_at);
        attempt.updated_at = Some(completed_at);
        Ok(attempt.clone())
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Attempt>> {
        let mut overdue: Vec<Attempt> = self
            .inner
            .read()
            .await
            .values()
            .filter(|a| {
                a.status == AttemptStatus::InProgress
                    && timer_service::is_expired(a.started_at, a.duration_minutes, now)
            })
            .cloned()
            .collect();
        overdue.sort_by_key(|a| a.started_at);
        Ok(overdue)
    }
}
