#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use exam_attempt_backend::error::Result;
use exam_attempt_backend::models::attempt::Attempt;
use exam_attempt_backend::models::test::{Question, TestMeta};
use exam_attempt_backend::repositories::memory::MemoryAttemptRepository;
use exam_attempt_backend::repositories::AttemptRepository;
use exam_attempt_backend::services::attempt_service::AttemptService;
use exam_attempt_backend::services::catalog_service::TestCatalog;
use exam_attempt_backend::services::notification_service::ActivityNotifier;
use exam_attempt_backend::services::timer_service::Clock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Catalog stub serving one fixed test regardless of id.
pub struct FakeCatalog {
    pub meta: TestMeta,
    pub questions: Vec<Question>,
}

impl FakeCatalog {
    pub fn new(duration_minutes: i32, passing_score: i32, correct_options: &[i32]) -> Self {
        Self {
            meta: TestMeta {
                duration_minutes,
                passing_score,
            },
            questions: correct_options
                .iter()
                .map(|&correct| Question {
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option_index: correct,
                })
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl TestCatalog for FakeCatalog {
    async fn fetch_test_meta(&self, _test_id: Uuid) -> Result<TestMeta> {
        Ok(self.meta.clone())
    }

    async fn fetch_questions(&self, _test_id: Uuid) -> Result<Vec<Question>> {
        Ok(self.questions.clone())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub completions: AtomicUsize,
}

#[async_trait::async_trait]
impl ActivityNotifier for CountingNotifier {
    async fn attempt_completed(&self, _attempt: &Attempt) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestExam {
    pub service: AttemptService,
    pub repo: Arc<MemoryAttemptRepository>,
    pub catalog: Arc<FakeCatalog>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<CountingNotifier>,
}

impl TestExam {
    /// In-memory exam backend with a manual clock anchored at "now".
    pub fn new(duration_minutes: i32, passing_score: i32, correct_options: &[i32]) -> Self {
        let repo = Arc::new(MemoryAttemptRepository::new());
        let catalog = Arc::new(FakeCatalog::new(
            duration_minutes,
            passing_score,
            correct_options,
        ));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let notifier = Arc::new(CountingNotifier::default());

        let service = AttemptService::with_clock(
            Arc::clone(&repo) as Arc<dyn AttemptRepository>,
            Arc::clone(&catalog) as Arc<dyn TestCatalog>,
            Arc::clone(&notifier) as Arc<dyn ActivityNotifier>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        Self {
            service,
            repo,
            catalog,
            clock,
            notifier,
        }
    }

    /// A second service over the same store and clock, as after an app
    /// kill-and-relaunch: no in-memory state survives except what was
    /// persisted.
    pub fn relaunched(&self) -> AttemptService {
        AttemptService::with_clock(
            Arc::clone(&self.repo) as Arc<dyn AttemptRepository>,
            Arc::clone(&self.catalog) as Arc<dyn TestCatalog>,
            Arc::clone(&self.notifier) as Arc<dyn ActivityNotifier>,
            Arc::clone(&self.clock) as Arc<dyn Clock>,
        )
    }
}
