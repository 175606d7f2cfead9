use std::fmt;

use async_graphql::{Enum, SimpleObject};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::test_policy::{ALLOWED_QUESTION_COUNTS, SECONDS_PER_QUESTION};
use crate::errors::{AppError, AppResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
            ExperienceLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the test-taker asked for. Never changes once a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct TestConfiguration {
    pub id: String,
    pub topic: String,
    pub experience_level: ExperienceLevel,
    pub specialization: Option<String>,
    pub question_count: u16,
}

impl TestConfiguration {
    pub fn new(
        topic: &str,
        experience_level: ExperienceLevel,
        specialization: Option<&str>,
        question_count: u16,
    ) -> AppResult<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::ValidationError(
                "Topic must not be empty".to_string(),
            ));
        }

        if !ALLOWED_QUESTION_COUNTS.contains(&question_count) {
            return Err(AppError::ValidationError(format!(
                "Question count must be one of {:?}, got {}",
                ALLOWED_QUESTION_COUNTS, question_count
            )));
        }

        let specialization = specialization
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(TestConfiguration {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            experience_level,
            specialization,
            question_count,
        })
    }

    pub fn time_budget_seconds(&self) -> u32 {
        SECONDS_PER_QUESTION * u32::from(self.question_count)
    }
}
