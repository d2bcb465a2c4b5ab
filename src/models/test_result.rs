// src/models/test_result.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};

use crate::models::question::{AnswerKey, QuestionType};

/// Frozen review record of one question, captured at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    pub question_id: i64,
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
    pub explanation: Option<String>,
    pub points: i32,
    /// Exactly what the client sent for this question.
    pub user_answer: Value,
    pub correct_answer: AnswerKey,
    pub is_correct: bool,
    pub earned_points: i32,
}

/// The JSON stored in `test_results.snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSnapshot {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub passing_score: i32,
    pub earned_points: i32,
    pub total_points: i32,
    pub questions: Vec<QuestionSnapshot>,
}

/// Represents one row of the 'test_results' table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: Option<i64>,
    pub quiz_title: String,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub earned_points: i32,
    pub total_points: i32,
    pub passed: bool,
    pub time_spent: i32,
    pub snapshot: Json<ResultSnapshot>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Short listing row used by stats pages and the admin results view.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub quiz_id: Option<i64>,
    pub quiz_title: String,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub time_spent: i32,
    pub category: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a quiz attempt.
///
/// Both fields are kept loose here; the submission validator owns the shape rules
/// so that every malformed payload is reported the same way.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: Value,
    #[serde(default, rename = "timeSpent")]
    pub time_spent: Option<Value>,
}

/// Body of the `result` field returned after a committed submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub result_id: i64,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub earned_points: i32,
    pub total_points: i32,
    pub time_spent: i32,
    pub passed: bool,
}
