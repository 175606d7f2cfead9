use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    constants::test_policy::{DEFAULT_HISTORY_PAGE_SIZE, MAX_HISTORY_PAGE_SIZE},
    errors::{AppError, AppResult},
    models::{
        domain::{TestResult, TestSubmission},
        dto::response::ResultPage,
    },
    repositories::TestResultRepository,
    services::{
        grading_service::GradingService,
        notification_service::{Notification, NotificationDispatcher},
    },
};

/// Grades a finished session and returns its result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestScorer: Send + Sync {
    async fn score(&self, submission: TestSubmission) -> AppResult<TestResult>;
}

pub struct TestResultService {
    repository: Arc<dyn TestResultRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl TestResultService {
    pub fn new(
        repository: Arc<dyn TestResultRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    pub fn build_result(submission: &TestSubmission) -> TestResult {
        let report = GradingService::grade(&submission.questions, &submission.answers);

        TestResult {
            id: Uuid::new_v4().to_string(),
            configuration_id: submission.configuration_id.clone(),
            user_id: submission.test_taker.user_id.clone(),
            topic: submission.topic.clone(),
            experience_level: submission.experience_level,
            specialization: submission.specialization.clone(),
            score: report.score,
            correct_count: report.correct_count,
            total_questions: report.total_questions,
            time_spent_seconds: submission.time_spent_seconds,
            violation_summary: submission.violation_summary,
            question_outcomes: report.outcomes,
            submitted_at: Utc::now(),
        }
    }

    pub async fn get_result(&self, id: &str) -> AppResult<TestResult> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test result '{}' not found", id)))
    }

    pub async fn list_results(
        &self,
        user_id: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<ResultPage> {
        let offset = offset.unwrap_or(0).max(0);
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_PAGE_SIZE)
            .clamp(1, MAX_HISTORY_PAGE_SIZE);

        let (items, total) = self.repository.find_by_user(user_id, offset, limit).await?;
        Ok(ResultPage {
            items,
            total,
            offset,
            limit,
        })
    }

    pub async fn has_attempted(&self, user_id: &str, configuration_id: &str) -> AppResult<bool> {
        self.repository.has_attempted(user_id, configuration_id).await
    }

    /// Persistence and notification run detached; their failures are logged
    /// and never reach the caller.
    fn spawn_side_effects(&self, result: TestResult) {
        let repository = Arc::clone(&self.repository);
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let notification = Notification::for_result(&result);
            let result_id = result.id.clone();

            if let Err(e) = repository.create(result).await {
                log::error!("Failed to persist test result {}: {}", result_id, e);
            }
            if let Err(e) = notifier.dispatch(notification).await {
                log::warn!("Failed to dispatch notification for {}: {}", result_id, e);
            }
        });
    }
}

#[async_trait]
impl TestScorer for TestResultService {
    async fn score(&self, submission: TestSubmission) -> AppResult<TestResult> {
        let result = Self::build_result(&submission);

        log::info!(
            "Scored configuration {} for {}: {}% ({}/{})",
            result.configuration_id,
            result.user_id,
            result.score,
            result.correct_count,
            result.total_questions
        );

        self.spawn_side_effects(result.clone());
        Ok(result)
    }
}
