pub mod health_handler;
pub mod result_handler;
pub mod test_session_handler;

pub use health_handler::{health_check, health_check_ready};
pub use result_handler::{get_result, list_results};
pub use test_session_handler::configure_routes;
