pub mod test_result_repository;

pub use test_result_repository::{MongoTestResultRepository, TestResultRepository};
