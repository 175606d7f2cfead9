use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::test_policy::OPTIONS_PER_QUESTION;
use crate::errors::{AppError, AppResult};
use crate::models::domain::{
    ExperienceLevel, GeneratedQuestionSet, SessionStatus, TestConfiguration, TestSession,
    TestSubmission, TestTaker, ViolationLedger,
};
use crate::services::answer_navigator::{build_navigator, NavigatorView};
use crate::services::proctoring_monitor::{IntegrityEvent, MonitorOutcome, ProctoringMonitor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TickOutcome {
    Running { remaining_seconds: u32 },
    /// The countdown just hit zero. Reported once per session; later ticks
    /// report `Running { remaining_seconds: 0 }` until the session is submitted.
    Expired,
    /// Session is not active; nothing to count down.
    Idle,
}

/// Synchronous state of one proctored test.
///
/// Holds the committed session data plus the transient pieces the UI drives:
/// the current index, the pending (uncommitted) selection, the countdown and
/// the violation ledger.
///
/// Answers are frozen once time runs out, once the violation limit is hit and
/// while a submission is with the scorer. The session stays `Active` until a
/// submission lands, so a failed forced submit can be retried.
#[derive(Debug, Clone)]
pub struct TestSessionMachine {
    session: TestSession,
    current_index: usize,
    pending_selection: Option<usize>,
    remaining_seconds: u32,
    expiry_reported: bool,
    submission_pending: bool,
    ledger: ViolationLedger,
    monitor: ProctoringMonitor,
}

impl TestSessionMachine {
    pub fn configure(
        topic: &str,
        experience_level: ExperienceLevel,
        specialization: Option<&str>,
        question_count: u16,
        focus_loss_window_ms: i64,
    ) -> AppResult<Self> {
        let configuration =
            TestConfiguration::new(topic, experience_level, specialization, question_count)?;
        Ok(Self::from_configuration(configuration, focus_loss_window_ms))
    }

    pub fn from_configuration(configuration: TestConfiguration, focus_loss_window_ms: i64) -> Self {
        let remaining_seconds = configuration.time_budget_seconds();
        Self {
            session: TestSession::new(configuration),
            current_index: 0,
            pending_selection: None,
            remaining_seconds,
            expiry_reported: false,
            submission_pending: false,
            ledger: ViolationLedger::default(),
            monitor: ProctoringMonitor::new(focus_loss_window_ms),
        }
    }

    pub fn session(&self) -> &TestSession {
        &self.session
    }

    pub fn configuration(&self) -> &TestConfiguration {
        &self.session.configuration
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn pending_selection(&self) -> Option<usize> {
        self.pending_selection
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn ledger(&self) -> ViolationLedger {
        self.ledger
    }

    pub fn submission_pending(&self) -> bool {
        self.submission_pending
    }

    /// Whether the session must be submitted on the test-taker's behalf.
    pub fn submission_due(&self) -> bool {
        self.session.status == SessionStatus::Active
            && (self.remaining_seconds == 0 || self.monitor.force_submit_requested())
    }

    pub fn committed_answer(&self, question_index: usize) -> Option<usize> {
        self.session.answers.get(&question_index).copied()
    }

    /// Fails unless `begin` may still be called for this configuration.
    pub fn ensure_startable(&self) -> AppResult<()> {
        match self.session.status {
            SessionStatus::Configuring => Ok(()),
            SessionStatus::Active | SessionStatus::Submitted => Err(AppError::AlreadyAttempted(
                format!(
                    "Configuration {} has already been started",
                    self.session.configuration.id
                ),
            )),
        }
    }

    pub fn begin(&mut self, generated: GeneratedQuestionSet, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_startable()?;
        generated.validate(usize::from(self.session.configuration.question_count))?;

        self.session.public_questions = generated.questions;
        self.session.questions = generated.questions_with_answers;
        self.session.started_at = Some(now);
        self.session.deadline = Some(self.session.deadline_for(now));
        self.session.status = SessionStatus::Active;
        self.remaining_seconds = self.session.configuration.time_budget_seconds();
        self.current_index = 0;
        self.pending_selection = None;

        log::info!(
            "Test session {} started with {} questions, deadline {:?}",
            self.session.configuration.id,
            self.session.total_questions(),
            self.session.deadline
        );
        Ok(())
    }

    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> AppResult<()> {
        self.ensure_answerable()?;
        if question_index != self.current_index {
            return Err(AppError::ValidationError(format!(
                "Can only select an answer for the current question {} (got {})",
                self.current_index, question_index
            )));
        }
        if option_index >= OPTIONS_PER_QUESTION {
            return Err(AppError::ValidationError(format!(
                "Option index {} out of range",
                option_index
            )));
        }
        self.pending_selection = Some(option_index);
        Ok(())
    }

    /// Saves the pending selection and moves to the next question.
    /// Returns the index now displayed.
    pub fn commit_and_advance(&mut self) -> AppResult<usize> {
        self.ensure_answerable()?;
        let index = self.current_index;
        if let Some(option) = self.pending_selection {
            self.session.answers.insert(index, option);
        }
        self.session.visited.insert(index);

        if index + 1 < self.session.total_questions() {
            self.current_index = index + 1;
            self.pending_selection = self.committed_answer(self.current_index);
        }
        Ok(self.current_index)
    }

    pub fn clear_answer(&mut self, question_index: usize) -> AppResult<()> {
        self.ensure_answerable()?;
        self.ensure_in_range(question_index)?;
        self.session.answers.remove(&question_index);
        if question_index == self.current_index {
            self.pending_selection = None;
        }
        Ok(())
    }

    /// Returns whether the question is marked after the toggle.
    pub fn toggle_mark_for_review(&mut self, question_index: usize) -> AppResult<bool> {
        self.ensure_answerable()?;
        self.ensure_in_range(question_index)?;
        let marked = &mut self.session.marked_for_review;
        if marked.remove(&question_index) {
            Ok(false)
        } else {
            marked.insert(question_index);
            Ok(true)
        }
    }

    /// Leaves the current question without committing its pending selection.
    pub fn jump_to(&mut self, question_index: usize) -> AppResult<()> {
        self.ensure_answerable()?;
        self.ensure_in_range(question_index)?;
        self.current_index = question_index;
        self.session.visited.insert(question_index);
        self.pending_selection = self.committed_answer(question_index);
        Ok(())
    }

    pub fn elapsed_tick(&mut self) -> TickOutcome {
        if self.session.status != SessionStatus::Active {
            return TickOutcome::Idle;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            if self.expiry_reported {
                return TickOutcome::Running { remaining_seconds: 0 };
            }
            self.expiry_reported = true;
            log::info!("Time expired for test session {}", self.session.configuration.id);
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Violations outside an active session, or arriving after the answers
    /// were handed to the scorer, have nothing to affect.
    pub fn record_violation(&mut self, event: &IntegrityEvent) -> MonitorOutcome {
        if self.session.status != SessionStatus::Active || self.submission_pending {
            return MonitorOutcome::Ignored;
        }
        let (ledger, outcome) = self.monitor.observe(self.ledger, event);
        self.ledger = ledger;
        if let Some(warning) = outcome.warning() {
            log::warn!(
                "Test session {}: {} ({}/{})",
                self.session.configuration.id,
                warning.kind,
                warning.total,
                warning.threshold
            );
        }
        outcome
    }

    /// Builds the scoring request from committed answers only.
    pub fn prepare_submission(
        &self,
        test_taker: TestTaker,
        now: DateTime<Utc>,
    ) -> AppResult<TestSubmission> {
        self.ensure_active()?;
        let configuration = &self.session.configuration;

        Ok(TestSubmission {
            configuration_id: configuration.id.clone(),
            topic: configuration.topic.clone(),
            answers: self.session.answers.clone(),
            questions: self.session.questions.clone(),
            test_taker,
            question_count: configuration.question_count,
            experience_level: configuration.experience_level,
            specialization: configuration.specialization.clone(),
            time_spent_seconds: self.time_spent_seconds(now),
            violation_summary: self.ledger,
        })
    }

    /// Freezes the answers and returns what the scorer should grade.
    pub fn begin_submission(
        &mut self,
        test_taker: TestTaker,
        now: DateTime<Utc>,
    ) -> AppResult<TestSubmission> {
        let submission = self.prepare_submission(test_taker, now)?;
        self.submission_pending = true;
        Ok(submission)
    }

    /// Unfreezes the answers after the scorer rejected a submission.
    pub fn abort_submission(&mut self) {
        self.submission_pending = false;
    }

    pub fn mark_submitted(&mut self) -> AppResult<()> {
        self.ensure_active()?;
        self.session.status = SessionStatus::Submitted;
        self.submission_pending = false;
        self.pending_selection = None;
        log::info!("Test session {} submitted", self.session.configuration.id);
        Ok(())
    }

    /// Larger of wall-clock and ticked time, capped at the budget.
    pub fn time_spent_seconds(&self, now: DateTime<Utc>) -> u32 {
        let budget = self.session.configuration.time_budget_seconds();
        let ticked = budget - self.remaining_seconds.min(budget);
        let wall = self
            .session
            .started_at
            .map(|started| (now - started).num_seconds().clamp(0, i64::from(budget)) as u32)
            .unwrap_or(0);
        ticked.max(wall)
    }

    pub fn navigator(&self) -> NavigatorView {
        build_navigator(
            self.session.total_questions(),
            &self.session.answers,
            &self.session.marked_for_review,
            &self.session.visited,
            self.current_index,
        )
    }

    fn ensure_active(&self) -> AppResult<()> {
        match self.session.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Configuring => Err(AppError::ValidationError(
                "Test has not been started".to_string(),
            )),
            SessionStatus::Submitted => Err(AppError::AlreadySubmitted(format!(
                "Configuration {} is already submitted",
                self.session.configuration.id
            ))),
        }
    }

    fn ensure_answerable(&self) -> AppResult<()> {
        self.ensure_active()?;
        if self.remaining_seconds == 0 {
            return Err(AppError::ValidationError("Time expired".to_string()));
        }
        if self.monitor.force_submit_requested() {
            return Err(AppError::ValidationError(
                "Violation limit reached; the test is being submitted".to_string(),
            ));
        }
        if self.submission_pending {
            return Err(AppError::ValidationError("Submission in progress".to_string()));
        }
        Ok(())
    }

    fn ensure_in_range(&self, question_index: usize) -> AppResult<()> {
        if question_index >= self.session.total_questions() {
            return Err(AppError::ValidationError(format!(
                "Question index {} out of range 0..{}",
                question_index,
                self.session.total_questions()
            )));
        }
        Ok(())
    }
}
