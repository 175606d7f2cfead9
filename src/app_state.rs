use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::MongoTestResultRepository,
    services::{
        notification_service::{
            LogNotificationDispatcher, NotificationDispatcher, WebhookNotificationDispatcher,
        },
        question_generator::OpenAiQuestionGenerator,
        session_registry::SessionRegistry,
        test_result_service::TestResultService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub session_registry: Arc<SessionRegistry>,
    pub test_result_service: Arc<TestResultService>,
    pub database: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let result_repository = Arc::new(MongoTestResultRepository::new(&db));
        result_repository.ensure_indexes().await?;

        let notifier: Arc<dyn NotificationDispatcher> = match &config.notification_webhook_url {
            Some(url) => Arc::new(WebhookNotificationDispatcher::new(url)),
            None => Arc::new(LogNotificationDispatcher),
        };
        let test_result_service = Arc::new(TestResultService::new(result_repository, notifier));

        let generator = Arc::new(OpenAiQuestionGenerator::new(&config));
        let session_registry = Arc::new(SessionRegistry::new(
            generator,
            test_result_service.clone(),
            config.focus_loss_window_ms,
        ));

        Ok(Self {
            session_registry,
            test_result_service,
            database: Some(db),
            config: Arc::new(config),
        })
    }

    /// Wires already-built services, without a database connection.
    pub fn from_parts(
        config: Config,
        session_registry: Arc<SessionRegistry>,
        test_result_service: Arc<TestResultService>,
    ) -> Self {
        Self {
            session_registry,
            test_result_service,
            database: None,
            config: Arc::new(config),
        }
    }
}
