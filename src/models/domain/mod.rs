pub mod mcq_question;
pub mod test_configuration;
pub mod test_result;
pub mod test_session;
pub mod violation_ledger;
pub use mcq_question::{GeneratedQuestionSet, PublicQuestion, Question};
pub use test_configuration::{ExperienceLevel, TestConfiguration};
pub use test_result::{QuestionOutcome, TestResult};
pub use test_session::{SessionStatus, TestSession, TestSubmission, TestTaker};
pub use violation_ledger::{ViolationKind, ViolationLedger, ViolationSummary};
