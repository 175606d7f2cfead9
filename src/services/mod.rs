pub mod answer_navigator;
pub mod grading_service;
pub mod notification_service;
pub mod proctoring_monitor;
pub mod question_generator;
pub mod question_normalizer;
pub mod session_machine;
pub mod session_registry;
pub mod test_result_service;
pub mod test_session_service;
