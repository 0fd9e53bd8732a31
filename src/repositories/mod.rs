pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::attempt::{Attempt, NewAttempt};
use crate::services::scoring_service::ScoreOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Storage seam for attempt records. The lifecycle service is the sole
/// writer of state and result fields; the answer payload is only ever
/// written through [`update_answers`](AttemptRepository::update_answers).
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Inserts a fresh in-progress attempt. Returns `Conflict` if an
    /// in-progress attempt already exists for the same (student, test).
    async fn insert(&self, new: NewAttempt) -> Result<Attempt>;

    async fn find_by_id(&self, id: Uuid) -> Result<Attempt>;

    async fn find_in_progress(&self, student_id: Uuid, test_id: Uuid) -> Result<Option<Attempt>>;

    /// Compare-and-swap write of the full answer payload. Fails with
    /// `Conflict` when `expected_version` is stale and with `InvalidState`
    /// when the attempt is terminal, so a slow in-flight write can never
    /// clobber a newer one or corrupt a finished record.
    async fn update_answers(
        &self,
        id: Uuid,
        expected_version: i64,
        answers: &JsonValue,
    ) -> Result<Attempt>;

    async fn set_foregrounded(&self, id: Uuid, foregrounded: bool) -> Result<Attempt>;

    /// Transitions in-progress -> completed, writing score, percentage,
    /// passed and completed_at in one atomic update. Calling it on an
    /// already-completed attempt returns the stored record unchanged;
    /// an expired attempt is `InvalidState`.
    async fn finalize(
        &self,
        id: Uuid,
        outcome: &ScoreOutcome,
        completed_at: DateTime<Utc>,
    ) -> Result<Attempt>;

    /// Administrative abandonment: in-progress -> expired, no score.
    /// Any terminal state is `InvalidState`.
    async fn mark_expired(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<Attempt>;

    /// In-progress attempts whose deadline has passed as of `now`.
    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Attempt>>;
}
