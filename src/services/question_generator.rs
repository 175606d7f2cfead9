use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::{
    config::Config,
    constants::question_prompt::render_mcq_prompt,
    errors::{AppError, AppResult},
    models::domain::{GeneratedQuestionSet, TestConfiguration},
    services::question_normalizer::{
        normalize_generated_questions, parse_question_batch, RawQuestionBatch,
    },
};

/// Source of generated multiple-choice questions.
///
/// Implementations return `ValidationError` when the request itself is
/// unacceptable and `GenerationFailure` for anything that went wrong upstream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, configuration: &TestConfiguration) -> AppResult<GeneratedQuestionSet>;
}

/// Chat-completion backed generator for any OpenAI-compatible endpoint.
pub struct OpenAiQuestionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuestionGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.openai_model.clone(),
        }
    }

    fn build_request(&self, configuration: &TestConfiguration) -> Value {
        let system_prompt = render_mcq_prompt(
            &configuration.topic,
            configuration.experience_level.as_str(),
            configuration.specialization.as_deref(),
            configuration.question_count,
        );

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                {
                    "role": "user",
                    "content": format!(
                        "Generate {} questions on {} now. The reply must validate against this JSON schema: {}",
                        configuration.question_count,
                        configuration.topic,
                        response_schema()
                    )
                }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        })
    }
}

fn response_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(RawQuestionBatch)).unwrap_or(Value::Null)
}

fn extract_message_content(response: &Value) -> AppResult<&str> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            AppError::GenerationFailure("Generator response contained no message".to_string())
        })
}

#[async_trait]
impl QuestionGenerator for OpenAiQuestionGenerator {
    async fn generate(&self, configuration: &TestConfiguration) -> AppResult<GeneratedQuestionSet> {
        log::info!(
            "Requesting {} {} questions on '{}' from {}",
            configuration.question_count,
            configuration.experience_level,
            configuration.topic,
            self.model
        );

        let request = self.build_request(configuration);
        let response: Value = self.client.chat().create_byot(request).await?;

        let content = extract_message_content(&response)?;
        let batch = parse_question_batch(content)?;
        let questions = normalize_generated_questions(batch)?;

        let generated = GeneratedQuestionSet::from_scoring_view(questions);
        generated.validate(usize::from(configuration.question_count))?;

        log::info!(
            "Generated {} questions for configuration {}",
            generated.questions.len(),
            configuration.id
        );
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::test_configuration;

    #[test]
    fn build_request_embeds_configuration() {
        let generator = OpenAiQuestionGenerator::new(&Config::test_config());
        let configuration = test_configuration(15);

        let request = generator.build_request(&configuration);

        assert_eq!(request["model"], "test-model");
        assert_eq!(request["response_format"]["type"], "json_object");
        let system = request["messages"][0]["content"].as_str().unwrap_or_default();
        assert!(system.contains("exactly 15 questions"));
        assert!(system.contains("JavaScript"));
        let user = request["messages"][1]["content"].as_str().unwrap_or_default();
        assert!(user.contains("questions"));
    }

    #[test]
    fn response_schema_describes_question_batch() {
        let schema = response_schema();
        assert!(schema.to_string().contains("correct_answer"));
    }

    #[test]
    fn extract_message_content_requires_a_message() {
        let ok = json!({ "choices": [{ "message": { "content": "{\"questions\": []}" } }] });
        assert_eq!(
            extract_message_content(&ok).expect("content present"),
            "{\"questions\": []}"
        );

        let empty = json!({ "choices": [] });
        assert!(matches!(
            extract_message_content(&empty),
            Err(AppError::GenerationFailure(_))
        ));
    }
}
