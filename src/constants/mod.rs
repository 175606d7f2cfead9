pub mod question_prompt;
pub mod test_policy;
