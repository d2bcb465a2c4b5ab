// src/scoring/mod.rs

//! Submission scoring and aggregation engine.
//!
//! Validator -> Evaluator (once per question) -> Assembler -> Aggregate updater.
//! Only the last step writes, and it does so in a single transaction.

pub mod aggregates;
pub mod assembler;
pub mod evaluator;
pub mod validator;

use std::fmt;

use sqlx::PgPool;

use crate::{
    config::Config,
    models::test_result::{SubmissionReceipt, SubmitQuizRequest},
};

/// Failure taxonomy of a submission.
#[derive(Debug)]
pub enum SubmissionError {
    /// Bad request shape. Never retried.
    Validation(String),
    /// Quiz or user does not exist (or vanished before the write).
    NotFound(String),
    /// Storage failure; the transaction was rolled back and the caller may resubmit.
    Persistence(String),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Validation(msg) => write!(f, "validation error: {}", msg),
            SubmissionError::NotFound(msg) => write!(f, "not found: {}", msg),
            SubmissionError::Persistence(msg) => write!(f, "persistence error: {}", msg),
        }
    }
}

impl std::error::Error for SubmissionError {}

impl From<sqlx::Error> for SubmissionError {
    fn from(err: sqlx::Error) -> Self {
        SubmissionError::Persistence(err.to_string())
    }
}

/// Per-transaction bounds for the write path, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct TransactionLimits {
    pub statement_timeout_ms: u64,
    pub lock_timeout_ms: u64,
}

impl From<&Config> for TransactionLimits {
    fn from(config: &Config) -> Self {
        TransactionLimits {
            statement_timeout_ms: config.submit_statement_timeout_ms,
            lock_timeout_ms: config.submit_lock_timeout_ms,
        }
    }
}

/// Who is submitting, as supplied by the authentication layer.
#[derive(Debug, Clone)]
pub struct Submitter {
    pub user_id: i64,
    pub user_agent: Option<String>,
}

/// Scores a submission and records it together with both aggregates.
///
/// A receipt is only returned after the commit succeeded; every error means
/// nothing was written.
pub async fn submit_quiz(
    pool: &PgPool,
    limits: TransactionLimits,
    submitter: &Submitter,
    quiz_id: i64,
    request: SubmitQuizRequest,
) -> Result<SubmissionReceipt, SubmissionError> {
    let submission = validator::validate_submission(pool, quiz_id, request)
        .await
        .inspect_err(|e| log_failure(e, submitter.user_id, quiz_id))?;

    let evaluations = evaluator::evaluate_all(&submission.quiz.questions, &submission.answers);
    let assembled = assembler::assemble(&submission, &evaluations);

    let committed = aggregates::record_submission(
        pool,
        limits,
        submitter.user_id,
        submitter.user_agent.as_deref(),
        &submission.quiz,
        &assembled,
    )
    .await
    .inspect_err(|e| log_failure(e, submitter.user_id, quiz_id))?;

    tracing::info!(
        user_id = submitter.user_id,
        quiz_id,
        result_id = committed.result_id,
        score = assembled.score,
        user_tests_completed = committed.user_tests_completed,
        user_total_score = committed.user_total_score,
        user_average_score = committed.user_average_score,
        quiz_times_taken = committed.quiz_times_taken,
        quiz_average_score = committed.quiz_average_score,
        "Submission recorded"
    );

    Ok(SubmissionReceipt {
        result_id: committed.result_id,
        score: assembled.score,
        correct_answers: assembled.correct_count,
        total_questions: assembled.total_questions,
        earned_points: assembled.earned_points,
        total_points: assembled.total_points,
        time_spent: assembled.time_spent,
        passed: assembled.passed,
    })
}

fn log_failure(err: &SubmissionError, user_id: i64, quiz_id: i64) {
    match err {
        SubmissionError::Persistence(_) => {
            tracing::error!(user_id, quiz_id, "Submission not recorded: {}", err);
        }
        _ => tracing::warn!(user_id, quiz_id, "Submission rejected: {}", err),
    }
}
