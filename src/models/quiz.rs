// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    config::DEFAULT_PASSING_SCORE,
    models::question::{CreateQuestionRequest, PublicQuestion, Question},
};

/// Quiz header columns of the 'quizzes' table.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i32,
    pub passing_score: i32,
}

/// Immutable snapshot of a quiz and its ordered questions, read once per submission.
///
/// Serialized only for authors: the payload carries answer keys and has the shape
/// `UpsertQuizRequest` accepts, so it can be edited and sent back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i32,
    pub passing_score: i32,
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    pub fn from_parts(row: QuizRow, questions: Vec<Question>) -> Self {
        QuizDefinition {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            difficulty: row.difficulty,
            time_limit: row.time_limit,
            passing_score: row.passing_score,
            questions,
        }
    }
}

/// Listing entry with the quiz-level aggregate.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i32,
    pub passing_score: i32,
    pub question_count: i64,
    pub times_taken: i32,
    pub average_score: f64,
}

/// DTO for taking a quiz: the definition without answer keys.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i32,
    pub passing_score: i32,
    pub questions: Vec<PublicQuestion>,
}

impl From<&QuizDefinition> for PublicQuiz {
    fn from(quiz: &QuizDefinition) -> Self {
        PublicQuiz {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty.clone(),
            time_limit: quiz.time_limit,
            passing_score: quiz.passing_score,
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

fn default_category() -> String {
    "general".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_time_limit() -> i32 {
    60
}

fn default_passing_score() -> i32 {
    DEFAULT_PASSING_SCORE
}

/// DTO for creating or replacing a quiz together with its questions.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default = "default_difficulty")]
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
    /// Minutes.
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 1, max = 600))]
    pub time_limit: i32,
    #[serde(default = "default_passing_score")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score: i32,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

impl UpsertQuizRequest {
    /// Cross-field checks `validator` cannot express: every answer key must fit its question.
    pub fn check_answer_keys(&self) -> Result<(), String> {
        for (idx, question) in self.questions.iter().enumerate() {
            question
                .answer_key
                .check_against(question.question_type, &question.options)
                .map_err(|e| format!("question {}: {}", idx + 1, e))?;
        }
        Ok(())
    }
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    match difficulty {
        "easy" | "medium" | "hard" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_difficulty")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(questions: serde_json::Value) -> UpsertQuizRequest {
        serde_json::from_value(serde_json::json!({
            "title": "Capitals",
            "questions": questions,
        }))
        .unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let req = request(serde_json::json!([{
            "type": "true-false",
            "content": "The Dnipro flows through Kyiv",
            "answerKey": {"kind": "true-false", "correct": true}
        }]));

        assert_eq!(req.category, "general");
        assert_eq!(req.difficulty, "medium");
        assert_eq!(req.passing_score, DEFAULT_PASSING_SCORE);
        assert_eq!(req.questions[0].points, 1);
        assert!(req.validate().is_ok());
        assert!(req.check_answer_keys().is_ok());
    }

    #[test]
    fn nested_question_errors_surface() {
        let req = request(serde_json::json!([{
            "type": "single",
            "content": "",
            "options": ["A", "B"],
            "answerKey": {"kind": "single-choice", "correct": 0}
        }]));
        assert!(req.validate().is_err());
    }

    #[test]
    fn answer_key_errors_name_the_question() {
        let req = request(serde_json::json!([
            {
                "type": "single",
                "content": "First",
                "options": ["A", "B"],
                "answerKey": {"kind": "single-choice", "correct": 1}
            },
            {
                "type": "multiple",
                "content": "Second",
                "options": ["A", "B"],
                "answerKey": {"kind": "single-choice", "correct": 1}
            }
        ]));
        let err = req.check_answer_keys().unwrap_err();
        assert!(err.starts_with("question 2:"), "{}", err);
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        let mut req = request(serde_json::json!([{
            "type": "true-false",
            "content": "Q",
            "answerKey": {"kind": "true-false", "correct": false}
        }]));
        req.difficulty = "extreme".to_string();
        assert!(req.validate().is_err());
    }
}
