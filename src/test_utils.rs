#[cfg(test)]
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::models::domain::{
        ExperienceLevel, GeneratedQuestionSet, Question, TestConfiguration, TestResult,
        ViolationKind, ViolationLedger,
    };
    use crate::services::proctoring_monitor::IntegrityEvent;

    /// Fixed start instant so deadlines are predictable
    pub fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    /// Scoring-view questions whose correct option cycles through 0..4
    pub fn scoring_questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|index| Question {
                index,
                prompt: format!("Which statement about closures is true? (#{})", index + 1),
                options: [
                    format!("Option A for {}", index),
                    format!("Option B for {}", index),
                    format!("Option C for {}", index),
                    format!("Option D for {}", index),
                ],
                correct_option_index: index % 4,
                explanation: format!("Option {} is correct", index % 4),
            })
            .collect()
    }

    pub fn generated_set(count: usize) -> GeneratedQuestionSet {
        GeneratedQuestionSet::from_scoring_view(scoring_questions(count))
    }

    pub fn test_configuration(question_count: u16) -> TestConfiguration {
        TestConfiguration::new("JavaScript", ExperienceLevel::Intermediate, None, question_count)
            .expect("fixture configuration is valid")
    }

    pub fn stored_result(id: &str, user_id: &str) -> TestResult {
        TestResult {
            id: id.to_string(),
            configuration_id: format!("cfg-{}", id),
            user_id: user_id.to_string(),
            topic: "JavaScript".to_string(),
            experience_level: ExperienceLevel::Intermediate,
            specialization: None,
            score: 70,
            correct_count: 7,
            total_questions: 10,
            time_spent_seconds: 540,
            violation_summary: ViolationLedger::default(),
            question_outcomes: vec![],
            submitted_at: started_at() + Duration::minutes(9),
        }
    }

    /// Integrity event observed `seconds` after `started_at`
    pub fn integrity_event(id: &str, kind: ViolationKind, seconds: i64) -> IntegrityEvent {
        IntegrityEvent {
            event_id: id.to_string(),
            kind,
            observed_at: started_at() + Duration::seconds(seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_scoring_questions() {
        let questions = scoring_questions(6);
        assert_eq!(questions.len(), 6);
        assert_eq!(questions[5].index, 5);
        assert_eq!(questions[5].correct_option_index, 1);
    }

    #[test]
    fn test_fixtures_generated_set_is_valid() {
        let set = generated_set(10);
        assert!(set.validate(10).is_ok());
    }
}
