use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::test_configuration::ExperienceLevel;
use crate::models::domain::violation_ledger::ViolationSummary;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct TestResult {
    pub id: String,
    pub configuration_id: String,
    pub user_id: String,
    pub topic: String,
    pub experience_level: ExperienceLevel,
    pub specialization: Option<String>,
    pub score: u32, // percentage, 0..=100
    pub correct_count: u32,
    pub total_questions: u32,
    pub time_spent_seconds: u32,
    pub violation_summary: ViolationSummary,
    pub question_outcomes: Vec<QuestionOutcome>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct QuestionOutcome {
    pub index: u32,
    pub selected_option_index: Option<u32>,
    pub correct_option_index: u32,
    pub is_correct: bool,
    pub explanation: String,
}

impl TestResult {
    /// Violations were recorded during the attempt. Advisory only.
    pub fn integrity_affected(&self) -> bool {
        self.violation_summary.total() > 0
    }
}
