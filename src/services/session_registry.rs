use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::SessionStatus,
        dto::{request::ConfigureTestRequest, response::StartTestResponse},
    },
    services::{
        question_generator::QuestionGenerator, session_machine::TestSessionMachine,
        test_result_service::TestScorer, test_session_service::TestSessionService,
    },
};

/// Tracks the single current session of each test-taker.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<TestSessionService>>>,
    generator: Arc<dyn QuestionGenerator>,
    scorer: Arc<dyn TestScorer>,
    focus_loss_window_ms: i64,
}

impl SessionRegistry {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        scorer: Arc<dyn TestScorer>,
        focus_loss_window_ms: i64,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generator,
            scorer,
            focus_loss_window_ms,
        }
    }

    /// Replaces any finished or unstarted session with a fresh one. Fails while
    /// the user still has an active test.
    pub async fn configure(
        &self,
        user_id: &str,
        request: ConfigureTestRequest,
    ) -> AppResult<Arc<TestSessionService>> {
        request.validate()?;

        let machine = TestSessionMachine::configure(
            &request.topic,
            request.experience_level,
            request.specialization.as_deref(),
            request.question_count,
            self.focus_loss_window_ms,
        )?;

        let configuration_id = machine.configuration().id.clone();

        // Session locks can be held across question generation; only
        // lock-free status reads happen under the registry lock.
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(user_id) {
            if existing.is_starting() || existing.status() == SessionStatus::Active {
                return Err(AppError::AlreadyExists(format!(
                    "User '{}' already has an active test session",
                    user_id
                )));
            }
        }

        let session = Arc::new(TestSessionService::new(
            machine,
            request.test_taker(user_id),
            Arc::clone(&self.generator),
            Arc::clone(&self.scorer),
        ));
        sessions.insert(user_id.to_string(), Arc::clone(&session));
        drop(sessions);

        log::info!("Configured test {} for {}", configuration_id, user_id);
        Ok(session)
    }

    pub async fn get(&self, user_id: &str) -> AppResult<Arc<TestSessionService>> {
        self.sessions
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No test session for user '{}'", user_id)))
    }

    /// Starts the user's configured session and its countdown.
    pub async fn start(&self, user_id: &str) -> AppResult<StartTestResponse> {
        let session = self.get(user_id).await?;
        let started = session.start().await?;
        session.spawn_countdown();
        Ok(started)
    }

    pub async fn active_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| session.status() == SessionStatus::Active)
            .count()
    }
}
