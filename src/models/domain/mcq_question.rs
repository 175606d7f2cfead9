use serde::{Deserialize, Serialize};

use crate::constants::test_policy::OPTIONS_PER_QUESTION;
use crate::errors::{AppError, AppResult};

/// Scoring view of a question. Never sent to the test-taker before submission.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub index: usize,
    pub prompt: String, // may embed fenced code
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_option_index: usize,
    pub explanation: String,
}

/// What the test-taker sees while the session is active.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub prompt: String,
    pub options: [String; OPTIONS_PER_QUESTION],
}

impl Question {
    pub fn public_view(&self) -> PublicQuestion {
        PublicQuestion {
            index: self.index,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
        }
    }
}

/// Both views of one generated test, index-aligned.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratedQuestionSet {
    pub questions: Vec<PublicQuestion>,
    pub questions_with_answers: Vec<Question>,
}

impl GeneratedQuestionSet {
    pub fn from_scoring_view(questions_with_answers: Vec<Question>) -> Self {
        let questions = questions_with_answers
            .iter()
            .map(Question::public_view)
            .collect();
        GeneratedQuestionSet {
            questions,
            questions_with_answers,
        }
    }

    /// Checks that the two views describe the same questions in the same order
    /// and that every answer key points at one of the options.
    pub fn validate(&self, expected_count: usize) -> AppResult<()> {
        if self.questions_with_answers.len() != expected_count {
            return Err(AppError::GenerationFailure(format!(
                "Expected {} questions, generator returned {}",
                expected_count,
                self.questions_with_answers.len()
            )));
        }

        if self.questions.len() != self.questions_with_answers.len() {
            return Err(AppError::GenerationFailure(
                "Public and scoring question lists differ in length".to_string(),
            ));
        }

        for (position, (public, scoring)) in self
            .questions
            .iter()
            .zip(self.questions_with_answers.iter())
            .enumerate()
        {
            if public.index != position || scoring.index != position {
                return Err(AppError::GenerationFailure(format!(
                    "Question at position {} is not index-aligned",
                    position
                )));
            }
            if public.prompt != scoring.prompt || public.options != scoring.options {
                return Err(AppError::GenerationFailure(format!(
                    "Public and scoring views disagree at index {}",
                    position
                )));
            }
            if scoring.correct_option_index >= OPTIONS_PER_QUESTION {
                return Err(AppError::GenerationFailure(format!(
                    "Correct option {} out of range at index {}",
                    scoring.correct_option_index, position
                )));
            }
        }

        Ok(())
    }
}
