use crate::error::{Error, Result};
use crate::models::answer::{decode_answers, encode_answers, merge_answers, Answer};
use crate::models::attempt::{Attempt, AttemptStatus, NewAttempt};
use crate::repositories::AttemptRepository;
use crate::services::catalog_service::TestCatalog;
use crate::services::notification_service::ActivityNotifier;
use crate::services::scoring_service;
use crate::services::timer_service::{self, Clock, SystemClock};
use std::sync::Arc;
use uuid::Uuid;

/// Bounded re-reads when an answer write loses the version check to a
/// concurrent write. The conflict is re-resolved against fresh state, so
/// a retry merges rather than clobbers.
const ANSWER_WRITE_RETRIES: usize = 3;

/// State machine authority for a single attempt: creation, resumption,
/// answer submission, completion and expiry. Sole writer of state and
/// result fields.
#[derive(Clone)]
pub struct AttemptService {
    repo: Arc<dyn AttemptRepository>,
    catalog: Arc<dyn TestCatalog>,
    notifier: Arc<dyn ActivityNotifier>,
    clock: Arc<dyn Clock>,
}

impl AttemptService {
    pub fn new(
        repo: Arc<dyn AttemptRepository>,
        catalog: Arc<dyn TestCatalog>,
        notifier: Arc<dyn ActivityNotifier>,
    ) -> Self {
        Self::with_clock(repo, catalog, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repo: Arc<dyn AttemptRepository>,
        catalog: Arc<dyn TestCatalog>,
        notifier: Arc<dyn ActivityNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            catalog,
            notifier,
            clock,
        }
    }

    /// Starts an attempt, or resumes the in-progress one if it exists.
    /// Idempotent: starting again while one is live returns the same
    /// record unchanged, never a second row.
    pub async fn start(
        &self,
        student_id: Uuid,
        test_id: Uuid,
        course_id: Uuid,
    ) -> Result<Attempt> {
        if let Some(existing) = self.repo.find_in_progress(student_id, test_id).await? {
            tracing::info!(attempt_id = %existing.id, %student_id, %test_id, "resuming attempt");
            return Ok(existing);
        }

        let meta = self.catalog.fetch_test_meta(test_id).await?;
        let questions = self.catalog.fetch_questions(test_id).await?;

        let new = NewAttempt {
            student_id,
            test_id,
            course_id,
            question_count: questions.len() as i32,
            duration_minutes: meta.duration_minutes,
            started_at: self.clock.now(),
        };

        match self.repo.insert(new).await {
            Ok(attempt) => {
                tracing::info!(attempt_id = %attempt.id, %student_id, %test_id, "attempt started");
                Ok(attempt)
            }
            // Lost a create race to another start; resume the winner.
            Err(Error::Conflict(_)) => self
                .repo
                .find_in_progress(student_id, test_id)
                .await?
                .ok_or_else(|| {
                    Error::Conflict("Attempt creation raced and the winner vanished".to_string())
                }),
            Err(err) => Err(err),
        }
    }

    pub async fn get_attempt(&self, attempt_id: Uuid) -> Result<Attempt> {
        self.repo.find_by_id(attempt_id).await
    }

    pub async fn submit_answer(&self, attempt_id: Uuid, answer: Answer) -> Result<Attempt> {
        self.submit_answers_batch(attempt_id, &[answer]).await
    }

    /// Merges one or more answers into the attempt's payload with
    /// replace-by-index semantics, in a single persistence round trip.
    /// The write is a compare-and-swap on the record's version stamp: a
    /// slower write that raced a newer one re-reads and re-merges instead
    /// of overwriting it.
    pub async fn submit_answers_batch(
        &self,
        attempt_id: Uuid,
        incoming: &[Answer],
    ) -> Result<Attempt> {
        if incoming.is_empty() {
            return Err(Error::BadRequest("Answer batch is empty".to_string()));
        }

        let mut attempt = self.repo.find_by_id(attempt_id).await?;

        for retry in 0..=ANSWER_WRITE_RETRIES {
            self.ensure_writable(&attempt)?;
            for answer in incoming {
                if answer.question_index as i64 >= attempt.question_count as i64 {
                    return Err(Error::BadRequest(format!(
                        "Question index {} out of range for a test with {} questions",
                        answer.question_index, attempt.question_count
                    )));
                }
            }

            let merged = merge_answers(decode_answers(&attempt.answers), incoming);
            match self
                .repo
                .update_answers(attempt_id, attempt.version, &encode_answers(&merged))
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(Error::Conflict(_)) if retry < ANSWER_WRITE_RETRIES => {
                    attempt = self.repo.find_by_id(attempt_id).await?;
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::Conflict(
            "Answer write kept losing to concurrent updates".to_string(),
        ))
    }

    /// Decoded, index-sorted answer snapshot; undecodable entries skipped.
    pub async fn get_answers(&self, attempt_id: Uuid) -> Result<Vec<Answer>> {
        let attempt = self.repo.find_by_id(attempt_id).await?;
        Ok(decode_answers(&attempt.answers))
    }

    /// Completes and scores the attempt. Idempotent: a second call (user
    /// action and timer expiry can race here) returns the stored result
    /// unchanged and does not touch `completed_at`. Expired attempts
    /// cannot be completed.
    pub async fn complete(&self, attempt_id: Uuid) -> Result<Attempt> {
        let attempt = self.repo.find_by_id(attempt_id).await?;
        match attempt.status {
            AttemptStatus::Completed => return Ok(attempt),
            AttemptStatus::Expired => {
                return Err(Error::InvalidState(
                    "Attempt has expired and cannot be completed".to_string(),
                ))
            }
            AttemptStatus::InProgress => {}
        }

        let meta = self.catalog.fetch_test_meta(attempt.test_id).await?;
        let questions = self.catalog.fetch_questions(attempt.test_id).await?;
        let answers = decode_answers(&attempt.answers);
        let outcome = scoring_service::score(&answers, &questions, meta.passing_score);

        let completed_at = self.clock.now();
        let updated = self.repo.finalize(attempt_id, &outcome, completed_at).await?;

        // Notify only when this call performed the transition; a raced
        // finalize returns the earlier writer's record.
        if updated.completed_at == Some(completed_at) {
            tracing::info!(
                attempt_id = %attempt_id,
                score = outcome.correct_count,
                percentage = outcome.percentage,
                passed = outcome.passed,
                "attempt completed"
            );
            self.notifier.attempt_completed(&updated).await;
        }

        Ok(updated)
    }

    /// Administrative abandonment: forces `expired` without scoring.
    /// Time-up must NOT use this path; the timer goes through `complete`
    /// so the student still receives a score.
    pub async fn expire(&self, attempt_id: Uuid) -> Result<Attempt> {
        let expired = self.repo.mark_expired(attempt_id, self.clock.now()).await?;
        tracing::info!(attempt_id = %attempt_id, "attempt expired administratively");
        Ok(expired)
    }

    /// Recomputes remaining time from the persisted anchor. The instant it
    /// reaches zero the attempt is completed (idempotently), so a
    /// background-return check and a foreground poll tick observing expiry
    /// together still finalize once.
    pub async fn check_remaining(&self, attempt_id: Uuid) -> Result<(Attempt, i64)> {
        let attempt = self.repo.find_by_id(attempt_id).await?;
        if attempt.status.is_terminal() {
            return Ok((attempt, 0));
        }

        let remaining = timer_service::remaining_seconds(
            attempt.started_at,
            attempt.duration_minutes,
            self.clock.now(),
        );
        if remaining == 0 {
            let completed = self.complete(attempt_id).await?;
            return Ok((completed, 0));
        }
        Ok((attempt, remaining))
    }

    /// Marks the attempt backgrounded; answer mutation is rejected until
    /// the matching foreground report.
    pub async fn report_background(&self, attempt_id: Uuid) -> Result<Attempt> {
        self.repo.set_foregrounded(attempt_id, false).await
    }

    /// Re-enables mutation and reconciles remaining time against the
    /// anchor. An attempt whose deadline passed while backgrounded is
    /// completed here rather than handed back as writable.
    pub async fn report_foreground(&self, attempt_id: Uuid) -> Result<(Attempt, i64)> {
        let attempt = self.repo.set_foregrounded(attempt_id, true).await?;
        if attempt.status.is_terminal() {
            return Ok((attempt, 0));
        }

        let remaining = timer_service::remaining_seconds(
            attempt.started_at,
            attempt.duration_minutes,
            self.clock.now(),
        );
        if remaining == 0 {
            let completed = self.complete(attempt_id).await?;
            return Ok((completed, 0));
        }
        Ok((attempt, remaining))
    }

    /// Auto-completes every in-progress attempt whose deadline has passed.
    /// Run from the background sweeper; survives process restarts because
    /// it reads nothing but persisted anchors.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let overdue = self.repo.list_overdue(self.clock.now()).await?;
        let mut completed = 0;
        for attempt in overdue {
            match self.complete(attempt.id).await {
                Ok(_) => completed += 1,
                // Raced with a manual completion or administrative expiry.
                Err(Error::InvalidState(_)) => {}
                Err(err) => {
                    tracing::error!(
                        attempt_id = %attempt.id,
                        error = ?err,
                        "failed to auto-complete overdue attempt"
                    );
                }
            }
        }
        if completed > 0 {
            tracing::info!(count = completed, "auto-completed overdue attempts");
        }
        Ok(completed)
    }

    fn ensure_writable(&self, attempt: &Attempt) -> Result<()> {
        if !attempt.is_writable() {
            return Err(Error::InvalidState(
                "Cannot submit answers to a completed attempt".to_string(),
            ));
        }
        if !attempt.foregrounded {
            return Err(Error::InvalidState(
                "Cannot submit answers while the app is backgrounded".to_string(),
            ));
        }
        Ok(())
    }
}
