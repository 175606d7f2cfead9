use std::collections::BTreeMap;

use crate::models::domain::{QuestionOutcome, Question};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeReport {
    pub correct_count: u32,
    pub total_questions: u32,
    pub score: u32,
    pub outcomes: Vec<QuestionOutcome>,
}

pub struct GradingService;

impl GradingService {
    /// Grade committed answers against the scoring view.
    ///
    /// Every question counts toward the total; an unanswered question is
    /// simply incorrect.
    pub fn grade(questions: &[Question], answers: &BTreeMap<usize, usize>) -> GradeReport {
        let outcomes: Vec<QuestionOutcome> = questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected = answers.get(&index).copied();
                QuestionOutcome {
                    index: index as u32,
                    selected_option_index: selected.map(|s| s as u32),
                    correct_option_index: question.correct_option_index as u32,
                    is_correct: selected == Some(question.correct_option_index),
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        let correct_count = outcomes.iter().filter(|o| o.is_correct).count() as u32;
        let total_questions = questions.len() as u32;

        GradeReport {
            correct_count,
            total_questions,
            score: Self::score_percentage(correct_count, total_questions),
            outcomes,
        }
    }

    pub fn score_percentage(correct_count: u32, total_questions: u32) -> u32 {
        if total_questions == 0 {
            return 0;
        }
        (100.0 * f64::from(correct_count) / f64::from(total_questions)).round() as u32
    }
}
