use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{SessionStatus, TestConfiguration, TestResult, TestTaker},
        dto::response::{SessionSnapshot, StartTestResponse, ViolationReport},
    },
    services::{
        answer_navigator::NavigatorView,
        proctoring_monitor::{IntegrityEvent, MonitorOutcome},
        question_generator::QuestionGenerator,
        session_machine::{TestSessionMachine, TickOutcome},
        test_result_service::TestScorer,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(TestResult),
    /// Another submission holds the lock; no scoring call was made.
    InFlight,
}

/// Held while a start or submission is outstanding. Dropping it clears the flag.
struct FlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One test-taker's proctored test.
///
/// Every user action, timer tick and violation goes through the machine
/// mutex, so state changes are applied one at a time. Submission is
/// additionally fenced by `submission_in_flight`, which is claimed before the
/// first `.await` so the countdown expiry and a manual submit cannot both
/// reach the scorer.
///
/// The status is mirrored in a watch cell so it can be read while the
/// machine is locked for question generation.
pub struct TestSessionService {
    machine: Mutex<TestSessionMachine>,
    status: watch::Sender<SessionStatus>,
    start_in_flight: AtomicBool,
    submission_in_flight: AtomicBool,
    test_taker: TestTaker,
    generator: Arc<dyn QuestionGenerator>,
    scorer: Arc<dyn TestScorer>,
    result: RwLock<Option<TestResult>>,
}

impl std::fmt::Debug for TestSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSessionService")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl TestSessionService {
    pub fn new(
        machine: TestSessionMachine,
        test_taker: TestTaker,
        generator: Arc<dyn QuestionGenerator>,
        scorer: Arc<dyn TestScorer>,
    ) -> Self {
        let (status, _) = watch::channel(machine.status());
        Self {
            machine: Mutex::new(machine),
            status,
            start_in_flight: AtomicBool::new(false),
            submission_in_flight: AtomicBool::new(false),
            test_taker,
            generator,
            scorer,
            result: RwLock::new(None),
        }
    }

    pub fn test_taker(&self) -> &TestTaker {
        &self.test_taker
    }

    pub async fn configuration(&self) -> TestConfiguration {
        self.machine.lock().await.configuration().clone()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// True while questions are being generated for this session.
    pub fn is_starting(&self) -> bool {
        self.start_in_flight.load(Ordering::Acquire)
    }

    /// Generates the questions and opens the session. The machine stays locked
    /// for the whole call so other operations see the outcome of this one.
    pub async fn start(&self) -> AppResult<StartTestResponse> {
        let Some(_guard) = FlagGuard::acquire(&self.start_in_flight) else {
            return Err(AppError::AlreadyAttempted(
                "This test is already being started".to_string(),
            ));
        };
        let mut machine = self.machine.lock().await;
        machine.ensure_startable()?;

        let generated = self
            .generator
            .generate(machine.configuration())
            .await
            .map_err(|e| match e {
                AppError::ValidationError(_) | AppError::GenerationFailure(_) => e,
                other => AppError::GenerationFailure(other.to_string()),
            })?;

        machine.begin(generated, Utc::now())?;
        self.status.send_replace(machine.status());
        let session = machine.session();

        Ok(StartTestResponse {
            configuration_id: session.configuration.id.clone(),
            questions: session.public_questions.clone(),
            started_at: session.started_at,
            deadline: session.deadline,
            remaining_seconds: machine.remaining_seconds(),
        })
    }

    pub async fn select_answer(&self, question_index: usize, option_index: usize) -> AppResult<()> {
        self.machine
            .lock()
            .await
            .select_answer(question_index, option_index)
    }

    pub async fn commit_and_advance(&self) -> AppResult<usize> {
        self.machine.lock().await.commit_and_advance()
    }

    pub async fn clear_answer(&self, question_index: usize) -> AppResult<()> {
        self.machine.lock().await.clear_answer(question_index)
    }

    pub async fn toggle_mark_for_review(&self, question_index: usize) -> AppResult<bool> {
        self.machine.lock().await.toggle_mark_for_review(question_index)
    }

    pub async fn jump_to(&self, question_index: usize) -> AppResult<()> {
        self.machine.lock().await.jump_to(question_index)
    }

    /// Counts one second down. Once time is up, or the violation limit was
    /// hit, every tick retries the submission until one lands.
    pub async fn elapsed_tick(&self) -> TickOutcome {
        let (outcome, due) = {
            let mut machine = self.machine.lock().await;
            let outcome = machine.elapsed_tick();
            (outcome, machine.submission_due())
        };

        if due {
            self.submit_on_behalf().await;
        }
        outcome
    }

    /// Never fails: violations are recorded and reported, not raised.
    pub async fn record_violation(&self, event: IntegrityEvent) -> ViolationReport {
        let (outcome, violations, due) = {
            let mut machine = self.machine.lock().await;
            let outcome = machine.record_violation(&event);
            (outcome, machine.ledger(), machine.submission_due())
        };

        if matches!(outcome, MonitorOutcome::ForceSubmit(_)) {
            log::warn!(
                "Violation limit reached for {}, forcing submission",
                self.test_taker.user_id
            );
        }
        let result = if due {
            self.submit_on_behalf().await
        } else {
            None
        };

        ViolationReport {
            outcome,
            violations,
            result,
        }
    }

    /// Submits for a test-taker whose time ran out or who hit the violation
    /// limit. Failures are logged; the session stays due and is retried.
    async fn submit_on_behalf(&self) -> Option<TestResult> {
        let user_id = &self.test_taker.user_id;
        match self.submit().await {
            Ok(SubmitOutcome::Submitted(result)) => {
                log::info!("Submitted test for {} on their behalf", user_id);
                Some(result)
            }
            Ok(SubmitOutcome::InFlight) => {
                log::debug!("Forced submission for {} already in flight", user_id);
                None
            }
            Err(e) => {
                log::error!("Forced submission failed for {}: {}", user_id, e);
                None
            }
        }
    }

    pub async fn submit(&self) -> AppResult<SubmitOutcome> {
        let Some(_guard) = FlagGuard::acquire(&self.submission_in_flight) else {
            log::debug!(
                "Submission already in flight for {}",
                self.test_taker.user_id
            );
            return Ok(SubmitOutcome::InFlight);
        };

        let submission = {
            let mut machine = self.machine.lock().await;
            machine
                .begin_submission(self.test_taker.clone(), Utc::now())
                .inspect_err(|e| {
                    if matches!(e, AppError::AlreadySubmitted(_)) {
                        log::error!(
                            "Submit reached an already submitted session for {}",
                            self.test_taker.user_id
                        );
                    }
                })?
        };

        let result = match self.scorer.score(submission).await {
            Ok(result) => result,
            Err(e) => {
                self.machine.lock().await.abort_submission();
                return Err(match e {
                    AppError::SubmissionTransport(_) => e,
                    other => AppError::SubmissionTransport(other.to_string()),
                });
            }
        };

        {
            let mut machine = self.machine.lock().await;
            machine.mark_submitted()?;
            self.status.send_replace(machine.status());
        }
        *self.result.write().await = Some(result.clone());

        Ok(SubmitOutcome::Submitted(result))
    }

    pub async fn result(&self) -> Option<TestResult> {
        self.result.read().await.clone()
    }

    pub async fn navigator(&self) -> NavigatorView {
        self.machine.lock().await.navigator()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let result = self.result().await;
        let machine = self.machine.lock().await;
        let session = machine.session();

        SessionSnapshot {
            configuration: session.configuration.clone(),
            status: session.status,
            questions: session.public_questions.clone(),
            current_index: machine.current_index(),
            pending_selection: machine.pending_selection(),
            answers: session.answers.clone(),
            marked_for_review: session.marked_for_review.iter().copied().collect(),
            remaining_seconds: machine.remaining_seconds(),
            started_at: session.started_at,
            deadline: session.deadline,
            violations: machine.ledger(),
            result,
        }
    }

    /// Drives `elapsed_tick` once a second until the session is submitted.
    /// Holds only a weak reference, so dropping the session ends the task.
    pub fn spawn_countdown(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(session) = session.upgrade() else {
                    break;
                };
                if session.elapsed_tick().await == TickOutcome::Idle {
                    break;
                }
            }
        })
    }
}
