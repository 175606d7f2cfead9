use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::constants::test_policy::OPTIONS_PER_QUESTION;
use crate::errors::{AppError, AppResult};
use crate::models::domain::Question;

static LETTER_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:option[\s_-]*)?([a-d])\s*[).:]?\s*$")
        .expect("LETTER_KEY_REGEX is a valid regex pattern")
});

static OPTION_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\(?([A-Da-d])[).:]\s+")
        .expect("OPTION_PREFIX_REGEX is a valid regex pattern")
});

static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
        .expect("CODE_FENCE_REGEX is a valid regex pattern")
});

/// Generator payload before normalization.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RawQuestionBatch {
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RawQuestion {
    #[serde(alias = "prompt", alias = "question_text")]
    pub question: String,
    pub options: RawOptions,
    #[serde(alias = "correctAnswer", alias = "answer")]
    pub correct_answer: RawAnswerKey,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawOptions {
    Listed(Vec<String>),
    /// e.g. `{"A": "...", "B": "...", "C": "...", "D": "..."}`
    Keyed(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawAnswerKey {
    Index(usize),
    Label(String),
}

/// Parses a model reply, tolerating a surrounding markdown code fence.
pub fn parse_question_batch(content: &str) -> AppResult<RawQuestionBatch> {
    let body = CODE_FENCE_REGEX
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    serde_json::from_str(body)
        .map_err(|e| AppError::GenerationFailure(format!("Unreadable generator output: {}", e)))
}

/// Converts any accepted raw shape into the canonical index-ordered questions.
pub fn normalize_generated_questions(batch: RawQuestionBatch) -> AppResult<Vec<Question>> {
    batch
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| normalize_question(index, raw))
        .collect()
}

fn normalize_question(index: usize, raw: RawQuestion) -> AppResult<Question> {
    let prompt = raw.question.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::GenerationFailure(format!(
            "Question {} has an empty prompt",
            index
        )));
    }

    let options = match raw.options {
        RawOptions::Listed(list) => strip_option_labels(list),
        RawOptions::Keyed(map) => order_keyed_options(index, map)?,
    };

    let options: [String; OPTIONS_PER_QUESTION] = options.try_into().map_err(|v: Vec<String>| {
        AppError::GenerationFailure(format!(
            "Question {} has {} options, expected {}",
            index,
            v.len(),
            OPTIONS_PER_QUESTION
        ))
    })?;

    let correct_option_index = resolve_answer_key(index, &raw.correct_answer, &options)?;

    Ok(Question {
        index,
        prompt,
        options,
        correct_option_index,
        explanation: raw.explanation.trim().to_string(),
    })
}

fn letter_position(key: &str) -> Option<usize> {
    LETTER_KEY_REGEX
        .captures(key)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().chars().next())
        .map(|c| (c.to_ascii_uppercase() as u8 - b'A') as usize)
}

fn order_keyed_options(index: usize, map: BTreeMap<String, String>) -> AppResult<Vec<String>> {
    let mut slots: [Option<String>; OPTIONS_PER_QUESTION] = Default::default();
    for (key, text) in map {
        let position = letter_position(&key).ok_or_else(|| {
            AppError::GenerationFailure(format!(
                "Question {} has unrecognised option key '{}'",
                index, key
            ))
        })?;
        if slots[position].replace(text.trim().to_string()).is_some() {
            return Err(AppError::GenerationFailure(format!(
                "Question {} repeats option key '{}'",
                index, key
            )));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| {
                AppError::GenerationFailure(format!(
                    "Question {} is missing option {}",
                    index,
                    (b'A' + position as u8) as char
                ))
            })
        })
        .collect()
}

/// Drops `A) `-style prefixes, but only when all options carry them in order.
fn strip_option_labels(options: Vec<String>) -> Vec<String> {
    let labelled = options.len() == OPTIONS_PER_QUESTION
        && options.iter().enumerate().all(|(position, text)| {
            let expected = (b'A' + position as u8) as char;
            OPTION_PREFIX_REGEX
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().eq_ignore_ascii_case(&expected.to_string()))
                .unwrap_or(false)
        });

    options
        .into_iter()
        .map(|text| {
            if labelled {
                OPTION_PREFIX_REGEX.replace(&text, "").trim().to_string()
            } else {
                text.trim().to_string()
            }
        })
        .collect()
}

fn resolve_answer_key(
    index: usize,
    key: &RawAnswerKey,
    options: &[String; OPTIONS_PER_QUESTION],
) -> AppResult<usize> {
    let resolved = match key {
        RawAnswerKey::Index(i) => Some(*i),
        RawAnswerKey::Label(label) => letter_position(label)
            .or_else(|| label.trim().parse::<usize>().ok())
            .or_else(|| {
                options
                    .iter()
                    .position(|option| option.eq_ignore_ascii_case(label.trim()))
            }),
    };

    match resolved {
        Some(i) if i < OPTIONS_PER_QUESTION => Ok(i),
        _ => Err(AppError::GenerationFailure(format!(
            "Question {} has an unusable answer key {:?}",
            index, key
        ))),
    }
}
