// src/models/question.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

use crate::config::DEFAULT_QUESTION_POINTS;

/// The comparison algorithm used to decide whether an answer is correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    Matching,
    Ordering,
    ShortAnswer,
}

/// Question type tag as stored in `questions.question_type`.
///
/// Image, graph and text-based variants only change how the question is presented;
/// they share the single- or multiple-choice policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    Single,
    Multiple,
    TrueFalse,
    Matching,
    Ordering,
    ShortAnswer,
    SingleImage,
    MultipleImage,
    GraphTable,
    TextBased,
}

impl QuestionType {
    pub fn policy(self) -> Policy {
        match self {
            QuestionType::Single
            | QuestionType::SingleImage
            | QuestionType::GraphTable
            | QuestionType::TextBased => Policy::SingleChoice,
            QuestionType::Multiple | QuestionType::MultipleImage => Policy::MultipleChoice,
            QuestionType::TrueFalse => Policy::TrueFalse,
            QuestionType::Matching => Policy::Matching,
            QuestionType::Ordering => Policy::Ordering,
            QuestionType::ShortAnswer => Policy::ShortAnswer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::TrueFalse => "true-false",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::SingleImage => "single-image",
            QuestionType::MultipleImage => "multiple-image",
            QuestionType::GraphTable => "graph-table",
            QuestionType::TextBased => "text-based",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s {
            "single" => QuestionType::Single,
            "multiple" => QuestionType::Multiple,
            "true-false" => QuestionType::TrueFalse,
            "matching" => QuestionType::Matching,
            "ordering" => QuestionType::Ordering,
            "short-answer" => QuestionType::ShortAnswer,
            "single-image" => QuestionType::SingleImage,
            "multiple-image" => QuestionType::MultipleImage,
            "graph-table" => QuestionType::GraphTable,
            "text-based" => QuestionType::TextBased,
            other => return Err(format!("unknown question type '{}'", other)),
        };
        Ok(parsed)
    }
}

/// Correctness specification of a question, one variant per policy.
/// Stored as JSON in `questions.answer_key`, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerKey {
    SingleChoice {
        correct: usize,
    },
    MultipleChoice {
        correct: BTreeSet<usize>,
    },
    TrueFalse {
        correct: bool,
    },
    /// Left index -> right index.
    Matching {
        pairs: BTreeMap<usize, usize>,
    },
    Ordering {
        sequence: Vec<String>,
    },
    ShortAnswer {
        accepted: Vec<String>,
        #[serde(default, rename = "caseSensitive")]
        case_sensitive: bool,
    },
}

impl AnswerKey {
    pub fn policy(&self) -> Policy {
        match self {
            AnswerKey::SingleChoice { .. } => Policy::SingleChoice,
            AnswerKey::MultipleChoice { .. } => Policy::MultipleChoice,
            AnswerKey::TrueFalse { .. } => Policy::TrueFalse,
            AnswerKey::Matching { .. } => Policy::Matching,
            AnswerKey::Ordering { .. } => Policy::Ordering,
            AnswerKey::ShortAnswer { .. } => Policy::ShortAnswer,
        }
    }

    /// Authoring-time consistency check between the key, the declared type and the options.
    pub fn check_against(
        &self,
        question_type: QuestionType,
        options: &[String],
    ) -> Result<(), String> {
        if self.policy() != question_type.policy() {
            return Err(format!(
                "answer key does not fit question type '{}'",
                question_type
            ));
        }

        match self {
            AnswerKey::SingleChoice { correct } => {
                if options.len() < 2 {
                    return Err("choice questions need at least two options".to_string());
                }
                if *correct >= options.len() {
                    return Err(format!("correct option {} is out of range", correct));
                }
            }
            AnswerKey::MultipleChoice { correct } => {
                if options.len() < 2 {
                    return Err("choice questions need at least two options".to_string());
                }
                if correct.is_empty() {
                    return Err("at least one option must be marked correct".to_string());
                }
                if let Some(out) = correct.iter().find(|&&idx| idx >= options.len()) {
                    return Err(format!("correct option {} is out of range", out));
                }
            }
            AnswerKey::TrueFalse { .. } => {}
            AnswerKey::Matching { pairs } => {
                if pairs.is_empty() {
                    return Err("matching questions need at least one pair".to_string());
                }
            }
            AnswerKey::Ordering { sequence } => {
                if sequence.len() < 2 {
                    return Err("ordering questions need at least two items".to_string());
                }
                if sequence.iter().any(|item| item.trim().is_empty()) {
                    return Err("ordering items cannot be blank".to_string());
                }
            }
            AnswerKey::ShortAnswer { accepted, .. } => {
                if !accepted.iter().any(|a| !a.trim().is_empty()) {
                    return Err("short-answer questions need an accepted answer".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Raw row of the 'questions' table.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub position: i32,
    pub question_type: String,
    pub content: String,
    pub options: Json<Vec<String>>,
    pub image_url: Option<String>,
    pub points: i32,
    pub explanation: Option<String>,
    pub answer_key: Json<AnswerKey>,
}

/// A question as read into a quiz snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
    pub points: i32,
    pub explanation: Option<String>,
    pub answer_key: AnswerKey,
}

impl TryFrom<QuestionRow> for Question {
    type Error = String;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type: QuestionType = row.question_type.parse()?;
        let answer_key = row.answer_key.0;
        if answer_key.policy() != question_type.policy() {
            return Err(format!(
                "question {} stores an answer key that does not fit type '{}'",
                row.id, question_type
            ));
        }

        Ok(Question {
            id: row.id,
            position: row.position,
            question_type,
            content: row.content,
            options: row.options.0,
            image_url: row.image_url,
            points: row.points.max(0),
            explanation: row.explanation,
            answer_key,
        })
    }
}

/// DTO for sending question to client (excludes answer key and explanation).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
    pub points: i32,
    /// Items to arrange, for ordering questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        // Sorted, never in key order.
        let items = match &q.answer_key {
            AnswerKey::Ordering { sequence } => {
                let mut shown = sequence.clone();
                shown.sort();
                Some(shown)
            }
            _ => None,
        };

        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            content: q.content.clone(),
            options: q.options.clone(),
            image_url: q.image_url.clone(),
            points: q.points,
            items,
        }
    }
}

fn default_points() -> i32 {
    DEFAULT_QUESTION_POINTS
}

/// DTO for creating a new question as part of a quiz.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
    #[serde(default = "default_points")]
    #[validate(range(min = 0, max = 1000))]
    pub points: i32,
    #[validate(length(max = 5000))]
    pub explanation: Option<String>,
    pub answer_key: AnswerKey,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > 20 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
