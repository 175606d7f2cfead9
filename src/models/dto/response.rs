use std::collections::BTreeMap;

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    PublicQuestion, SessionStatus, TestConfiguration, TestResult, ViolationLedger,
};
use crate::services::proctoring_monitor::{MonitorOutcome, ProctoringWarning};

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartTestResponse {
    pub configuration_id: String,
    pub questions: Vec<PublicQuestion>,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub remaining_seconds: u32,
}

/// Everything a client needs to re-render an in-progress test.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub configuration: TestConfiguration,
    pub status: SessionStatus,
    pub questions: Vec<PublicQuestion>,
    pub current_index: usize,
    pub pending_selection: Option<usize>,
    pub answers: BTreeMap<usize, usize>,
    pub marked_for_review: Vec<usize>,
    pub remaining_seconds: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub violations: ViolationLedger,
    pub result: Option<TestResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub result: Option<TestResult>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationReport {
    pub outcome: MonitorOutcome,
    pub violations: ViolationLedger,
    /// Set when this event forced the submission and it went through.
    pub result: Option<TestResult>,
}

impl ViolationReport {
    pub fn warning(&self) -> Option<&ProctoringWarning> {
        self.outcome.warning()
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ResultPage {
    pub items: Vec<TestResult>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}
