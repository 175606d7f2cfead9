use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::constants::test_policy::MAX_EVENT_CLOCK_SKEW_MS;
use crate::models::domain::{ExperienceLevel, TestTaker, ViolationKind};
use crate::services::proctoring_monitor::IntegrityEvent;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfigureTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,

    pub experience_level: ExperienceLevel,

    #[validate(length(max = 200))]
    pub specialization: Option<String>,

    pub question_count: u16,

    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl ConfigureTestRequest {
    pub fn test_taker(&self, user_id: &str) -> TestTaker {
        TestTaker {
            user_id: user_id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SelectAnswerRequest {
    pub question_index: usize,

    #[validate(range(max = 3))]
    pub option_index: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionIndexRequest {
    pub question_index: usize,
}

/// Client report of an integrity signal. The id lets the client retry
/// delivery without inflating the counters.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IntegrityEventRequest {
    #[validate(length(min = 1, max = 64))]
    pub event_id: Option<String>,

    pub kind: ViolationKind,

    pub observed_at: Option<DateTime<Utc>>,
}

impl IntegrityEventRequest {
    /// `observed_at` is kept only while it stays close to `received_at`.
    pub fn into_event(self, received_at: DateTime<Utc>) -> IntegrityEvent {
        let max_skew = Duration::milliseconds(MAX_EVENT_CLOCK_SKEW_MS);
        let observed_at = self
            .observed_at
            .filter(|observed| (*observed - received_at).abs() <= max_skew)
            .unwrap_or(received_at);

        IntegrityEvent {
            event_id: self
                .event_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind: self.kind,
            observed_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}
