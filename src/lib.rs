pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

use crate::repositories::postgres::PgAttemptRepository;
use crate::services::attempt_service::AttemptService;
use crate::services::catalog_service::HttpTestCatalog;
use crate::services::notification_service::{ActivityNotifier, NoopNotifier, WebhookNotifier};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub attempt_service: AttemptService,
}

impl AppState {
    pub fn new(attempt_service: AttemptService) -> Self {
        Self { attempt_service }
    }

    /// Production wiring: Postgres attempt store, HTTP catalog client and
    /// the optional completion webhook, all from the global config.
    pub fn from_pool(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let repo = Arc::new(PgAttemptRepository::new(pool));
        let catalog = Arc::new(HttpTestCatalog::new(config.catalog_base_url.clone()));
        let notifier: Arc<dyn ActivityNotifier> = match &config.activity_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(NoopNotifier),
        };

        Self::new(AttemptService::new(repo, catalog, notifier))
    }
}
