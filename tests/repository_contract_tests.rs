use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Notify, RwLock};

use mcq_proctor_server::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            ExperienceLevel, GeneratedQuestionSet, Question, SessionStatus, TestConfiguration,
            TestResult, ViolationLedger,
        },
        dto::request::ConfigureTestRequest,
    },
    repositories::TestResultRepository,
    services::{
        notification_service::{Notification, NotificationDispatcher, NotificationKind},
        question_generator::QuestionGenerator,
        session_registry::SessionRegistry,
        test_result_service::TestResultService,
        test_session_service::SubmitOutcome,
    },
};

struct InMemoryTestResultRepository {
    results: Arc<RwLock<HashMap<String, TestResult>>>,
}

impl InMemoryTestResultRepository {
    fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn len(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl TestResultRepository for InMemoryTestResultRepository {
    async fn create(&self, result: TestResult) -> AppResult<TestResult> {
        if self
            .has_attempted(&result.user_id, &result.configuration_id)
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "Result for configuration '{}' already stored",
                result.configuration_id
            )));
        }
        let mut results = self.results.write().await;
        results.insert(result.id.clone(), result.clone());
        Ok(result)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestResult>> {
        let results = self.results.read().await;
        Ok(results.get(id).cloned())
    }

    async fn has_attempted(&self, user_id: &str, configuration_id: &str) -> AppResult<bool> {
        let results = self.results.read().await;
        Ok(results
            .values()
            .any(|r| r.user_id == user_id && r.configuration_id == configuration_id))
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<TestResult>, i64)> {
        let results = self.results.read().await;
        let mut items: Vec<_> = results
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let total = items.len() as i64;
        let start = offset.max(0) as usize;
        let end = (start + limit.max(0) as usize).min(items.len());

        let page = if start >= items.len() {
            vec![]
        } else {
            items[start..end].to_vec()
        };

        Ok((page, total))
    }
}

struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn dispatch(&self, notification: Notification) -> AppResult<()> {
        self.sent.write().await.push(notification);
        Ok(())
    }
}

struct StaticGenerator;

#[async_trait]
impl QuestionGenerator for StaticGenerator {
    async fn generate(&self, configuration: &TestConfiguration) -> AppResult<GeneratedQuestionSet> {
        let questions = (0..configuration.question_count as usize)
            .map(|index| Question {
                index,
                prompt: format!("Question {}", index + 1),
                options: [
                    "first".to_string(),
                    "second".to_string(),
                    "third".to_string(),
                    "fourth".to_string(),
                ],
                correct_option_index: 1,
                explanation: "The second option is correct".to_string(),
            })
            .collect();
        Ok(GeneratedQuestionSet::from_scoring_view(questions))
    }
}

/// Holds generation open until released, so registry calls can be made
/// while a start is in progress.
struct GatedGenerator {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl QuestionGenerator for GatedGenerator {
    async fn generate(&self, configuration: &TestConfiguration) -> AppResult<GeneratedQuestionSet> {
        self.entered.notify_one();
        self.release.notified().await;
        StaticGenerator.generate(configuration).await
    }
}

fn stored_result(id: &str, user_id: &str, minutes_ago: i64) -> TestResult {
    TestResult {
        id: id.to_string(),
        configuration_id: format!("cfg-{}", id),
        user_id: user_id.to_string(),
        topic: "Rust".to_string(),
        experience_level: ExperienceLevel::Advanced,
        specialization: Some("async".to_string()),
        score: 80,
        correct_count: 8,
        total_questions: 10,
        time_spent_seconds: 600,
        violation_summary: ViolationLedger::default(),
        question_outcomes: vec![],
        submitted_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn configure_request(topic: &str) -> ConfigureTestRequest {
    ConfigureTestRequest {
        topic: topic.to_string(),
        experience_level: ExperienceLevel::Beginner,
        specialization: None,
        question_count: 10,
        name: Some("Ada".to_string()),
        email: Some("ada@example.com".to_string()),
    }
}

/// Side effects are detached, so poll until they land.
async fn wait_for<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn create_rejects_second_result_for_same_configuration() {
    let repository = InMemoryTestResultRepository::new();
    repository.create(stored_result("r1", "u1", 0)).await.unwrap();

    let mut duplicate = stored_result("r2", "u1", 0);
    duplicate.configuration_id = "cfg-r1".to_string();
    let err = repository.create(duplicate).await.unwrap_err();

    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert!(repository.has_attempted("u1", "cfg-r1").await.unwrap());
    assert!(!repository.has_attempted("u2", "cfg-r1").await.unwrap());
}

#[tokio::test]
async fn history_is_paginated_newest_first() {
    let repository = Arc::new(InMemoryTestResultRepository::new());
    for (i, minutes_ago) in [30, 10, 20].into_iter().enumerate() {
        repository
            .create(stored_result(&format!("r{}", i), "u1", minutes_ago))
            .await
            .unwrap();
    }
    repository.create(stored_result("other", "u2", 0)).await.unwrap();

    let service = TestResultService::new(repository, Arc::new(RecordingNotifier::new()));
    let page = service.list_results("u1", Some(0), Some(2)).await.unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, "r1");
    assert_eq!(page.items[1].id, "r2");

    let rest = service.list_results("u1", Some(2), Some(2)).await.unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].id, "r0");
}

#[tokio::test]
async fn missing_result_is_not_found() {
    let service = TestResultService::new(
        Arc::new(InMemoryTestResultRepository::new()),
        Arc::new(RecordingNotifier::new()),
    );

    let err = service.get_result("missing").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn submitted_test_is_persisted_and_notified() {
    let repository = Arc::new(InMemoryTestResultRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let results = Arc::new(TestResultService::new(repository.clone(), notifier.clone()));
    let registry = SessionRegistry::new(Arc::new(StaticGenerator), results.clone(), 1_000);

    let session = registry.configure("u1", configure_request("Rust")).await.unwrap();
    registry.start("u1").await.unwrap();
    for _ in 0..5 {
        let current = session.snapshot().await.current_index;
        session.select_answer(current, 1).await.unwrap();
        session.commit_and_advance().await.unwrap();
    }

    let SubmitOutcome::Submitted(result) = session.submit().await.unwrap() else {
        panic!("expected a submitted result");
    };
    assert_eq!(result.score, 50);
    assert_eq!(result.user_id, "u1");
    assert_eq!(result.question_outcomes.len(), 10);
    assert_eq!(
        result.question_outcomes[0].explanation,
        "The second option is correct"
    );

    wait_for(|| async { repository.len().await == 1 }).await;
    wait_for(|| async { notifier.sent.read().await.len() == 1 }).await;

    let stored = results.get_result(&result.id).await.unwrap();
    assert_eq!(stored, result);
    assert!(results
        .has_attempted("u1", &result.configuration_id)
        .await
        .unwrap());
    let sent = notifier.sent.read().await;
    assert_eq!(sent[0].kind, NotificationKind::TestCompleted);
    assert!(sent[0].message.contains("50%"));
}

#[tokio::test]
async fn registry_keeps_one_active_session_per_user() {
    let results = Arc::new(TestResultService::new(
        Arc::new(InMemoryTestResultRepository::new()),
        Arc::new(RecordingNotifier::new()),
    ));
    let registry = SessionRegistry::new(Arc::new(StaticGenerator), results, 1_000);

    registry.configure("u1", configure_request("Rust")).await.unwrap();
    registry.start("u1").await.unwrap();

    let err = registry
        .configure("u1", configure_request("Go"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(registry.active_count().await, 1);

    let session = registry.get("u1").await.unwrap();
    session.submit().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Submitted);

    let next = registry.configure("u1", configure_request("Go")).await.unwrap();
    assert_eq!(next.configuration().await.topic, "Go");
    assert_eq!(next.status(), SessionStatus::Configuring);
    assert_eq!(registry.active_count().await, 0);
}

#[tokio::test]
async fn configure_rejects_blank_topic_and_bad_count() {
    let results = Arc::new(TestResultService::new(
        Arc::new(InMemoryTestResultRepository::new()),
        Arc::new(RecordingNotifier::new()),
    ));
    let registry = SessionRegistry::new(Arc::new(StaticGenerator), results, 1_000);

    let err = registry
        .configure("u1", configure_request("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let mut request = configure_request("Rust");
    request.question_count = 12;
    let err = registry.configure("u1", request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    assert!(matches!(
        registry.get("u1").await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn generation_in_progress_does_not_block_the_registry() {
    let results = Arc::new(TestResultService::new(
        Arc::new(InMemoryTestResultRepository::new()),
        Arc::new(RecordingNotifier::new()),
    ));
    let generator = Arc::new(GatedGenerator {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let registry = Arc::new(SessionRegistry::new(generator.clone(), results, 1_000));
    registry.configure("u1", configure_request("Rust")).await.unwrap();
    registry.configure("u2", configure_request("Go")).await.unwrap();

    let starting = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.start("u1").await })
    };
    generator.entered.notified().await;

    let limit = StdDuration::from_millis(200);
    let reconfigure = tokio::time::timeout(limit, registry.configure("u1", configure_request("Go")))
        .await
        .expect("configure blocked behind generation");
    assert!(matches!(reconfigure, Err(AppError::AlreadyExists(_))));

    let other = tokio::time::timeout(limit, registry.get("u2"))
        .await
        .expect("lookup blocked behind generation")
        .unwrap();
    assert_eq!(other.status(), SessionStatus::Configuring);
    let active = tokio::time::timeout(limit, registry.active_count())
        .await
        .expect("active count blocked behind generation");
    assert_eq!(active, 0);

    generator.release.notify_one();
    starting.await.unwrap().unwrap();
    assert_eq!(registry.active_count().await, 1);
}
