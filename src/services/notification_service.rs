use crate::models::attempt::Attempt;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Side channel for "activity logged" events on completion. Fire-and-forget:
/// implementations log failures and never propagate them, because the
/// notification is not required for correctness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityNotifier: Send + Sync {
    async fn attempt_completed(&self, attempt: &Attempt);
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    target_url: String,
}

impl WebhookNotifier {
    pub fn new(target_url: String) -> Self {
        Self {
            client: Client::new(),
            target_url,
        }
    }
}

#[async_trait]
impl ActivityNotifier for WebhookNotifier {
    async fn attempt_completed(&self, attempt: &Attempt) {
        let payload = json!({
            "event": "attempt_completed",
            "attempt_id": attempt.id,
            "student_id": attempt.student_id,
            "test_id": attempt.test_id,
            "course_id": attempt.course_id,
            "score": attempt.score,
            "percentage": attempt.percentage,
            "passed": attempt.passed,
            "completed_at": attempt.completed_at,
        });

        match self.client.post(&self.target_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(attempt_id = %attempt.id, "activity logged");
            }
            Ok(resp) => {
                tracing::warn!(
                    attempt_id = %attempt.id,
                    status = %resp.status(),
                    "activity webhook rejected"
                );
            }
            Err(err) => {
                tracing::warn!(attempt_id = %attempt.id, error = %err, "activity webhook failed");
            }
        }
    }
}

/// Used when no webhook URL is configured.
#[derive(Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl ActivityNotifier for NoopNotifier {
    async fn attempt_completed(&self, _attempt: &Attempt) {}
}
