use crate::error::{Error, Result};
use crate::models::test::{Question, TestMeta};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

/// Read-only view of the external course/test/question catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestCatalog: Send + Sync {
    async fn fetch_test_meta(&self, test_id: Uuid) -> Result<TestMeta>;

    /// The full, order-sorted question list for a test. A question's
    /// position in this list is the question index answers refer to, so
    /// scoring must never run against a partial or reordered list.
    async fn fetch_questions(&self, test_id: Uuid) -> Result<Vec<Question>>;
}

#[derive(Clone)]
pub struct HttpTestCatalog {
    client: Client,
    base_url: String,
}

impl HttpTestCatalog {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogQuestion {
    position: i32,
    #[serde(default)]
    options: Vec<String>,
    correct_option_index: i32,
}

#[async_trait]
impl TestCatalog for HttpTestCatalog {
    async fn fetch_test_meta(&self, test_id: Uuid) -> Result<TestMeta> {
        let url = format!("{}/api/tests/{}", self.base_url, test_id);
        let resp = self.client.get(&url).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Test {} not found", test_id)));
        }
        let meta = resp.error_for_status()?.json::<TestMeta>().await?;
        Ok(meta)
    }

    async fn fetch_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let url = format!("{}/api/tests/{}/questions", self.base_url, test_id);
        let resp = self.client.get(&url).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Test {} not found", test_id)));
        }
        let mut questions = resp
            .error_for_status()?
            .json::<Vec<CatalogQuestion>>()
            .await?;

        // Index mapping is positional; never trust response ordering.
        questions.sort_by_key(|q| q.position);
        Ok(questions
            .into_iter()
            .map(|q| Question {
                options: q.options,
                correct_option_index: q.correct_option_index,
            })
            .collect())
    }
}
