use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::mcq_question::{PublicQuestion, Question};
use crate::models::domain::test_configuration::{ExperienceLevel, TestConfiguration};
use crate::models::domain::violation_ledger::ViolationSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Configuring,
    Active,
    Submitted,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Configuring => write!(f, "configuring"),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// Identity forwarded to the scorer with a submission.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestTaker {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl TestTaker {
    pub fn anonymous(user_id: &str) -> Self {
        TestTaker {
            user_id: user_id.to_string(),
            name: None,
            email: None,
        }
    }
}

/// One timed attempt at a generated set of questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestSession {
    pub configuration: TestConfiguration,
    pub questions: Vec<Question>,
    pub public_questions: Vec<PublicQuestion>,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub answers: BTreeMap<usize, usize>,
    pub marked_for_review: BTreeSet<usize>,
    pub visited: BTreeSet<usize>,
}

impl TestSession {
    pub fn new(configuration: TestConfiguration) -> Self {
        TestSession {
            configuration,
            questions: Vec::new(),
            public_questions: Vec::new(),
            started_at: None,
            deadline: None,
            status: SessionStatus::Configuring,
            answers: BTreeMap::new(),
            marked_for_review: BTreeSet::new(),
            visited: BTreeSet::new(),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn deadline_for(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        started_at + Duration::seconds(i64::from(self.configuration.time_budget_seconds()))
    }
}

/// Everything the scorer needs to grade a finished session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestSubmission {
    pub configuration_id: String,
    pub topic: String,
    pub answers: BTreeMap<usize, usize>,
    pub questions: Vec<Question>,
    pub test_taker: TestTaker,
    pub question_count: u16,
    pub experience_level: ExperienceLevel,
    pub specialization: Option<String>,
    pub time_spent_seconds: u32,
    pub violation_summary: ViolationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_session_starts_configuring_with_empty_ledgers() {
        let config = TestConfiguration::new("Rust", ExperienceLevel::Beginner, None, 10)
            .expect("valid configuration");
        let session = TestSession::new(config);

        assert_eq!(session.status, SessionStatus::Configuring);
        assert!(session.answers.is_empty());
        assert!(session.started_at.is_none());
    }

    #[test]
    fn deadline_is_question_count_times_budget() {
        let config = TestConfiguration::new("Rust", ExperienceLevel::Beginner, None, 20)
            .expect("valid configuration");
        let session = TestSession::new(config);
        let started = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();

        assert_eq!(
            session.deadline_for(started),
            Utc.with_ymd_and_hms(2026, 1, 1, 9, 40, 0).unwrap()
        );
    }
}
