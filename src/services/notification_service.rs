use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::domain::TestResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TestCompleted,
    IntegrityWarning,
}

/// A user-facing alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_result(result: &TestResult) -> Self {
        let mut message = format!(
            "You scored {}% ({}/{} correct) on your {} {} test.",
            result.score,
            result.correct_count,
            result.total_questions,
            result.experience_level,
            result.topic
        );
        if result.integrity_affected() {
            message.push_str(&format!(
                " {} proctoring violation(s) were recorded; your results may be affected.",
                result.violation_summary.total()
            ));
        }

        Notification {
            user_id: result.user_id.clone(),
            kind: if result.integrity_affected() {
                NotificationKind::IntegrityWarning
            } else {
                NotificationKind::TestCompleted
            },
            title: format!("{} test results", result.topic),
            message,
            created_at: result.submitted_at,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> AppResult<()>;
}

/// Posts notifications as JSON to an external alerting endpoint.
pub struct WebhookNotificationDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotificationDispatcher {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookNotificationDispatcher {
    async fn dispatch(&self, notification: Notification) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::InternalError(format!(
                "Notification webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct LogNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn dispatch(&self, notification: Notification) -> AppResult<()> {
        log::info!(
            "Notification for {}: {} - {}",
            notification.user_id,
            notification.title,
            notification.message
        );
        Ok(())
    }
}
