// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{quiz::PublicQuiz, test_result::SubmitQuizRequest},
    repositories::quizzes,
    scoring::{self, Submitter, TransactionLimits},
    utils::jwt::Claims,
};

/// Longest User-Agent kept on a result row.
const USER_AGENT_MAX_LEN: usize = 512;

/// Lists every quiz with its attempt count and average score.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = quizzes::list_summaries(&pool).await.map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Returns a quiz ready to be taken. Answer keys are never part of this payload.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = quizzes::load_definition(&pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load quiz {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    Ok(Json(PublicQuiz::from(&quiz)))
}

/// Scores an attempt and records it.
///
/// Every successful call creates a new result; retakes are independent attempts.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    State(limits): State<TransactionLimits>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    headers: HeaderMap,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let submitter = Submitter {
        user_id: claims.user_id()?,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(USER_AGENT_MAX_LEN).collect()),
    };

    let receipt = scoring::submit_quiz(&pool, limits, &submitter, quiz_id, req).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "result": receipt,
    })))
}
