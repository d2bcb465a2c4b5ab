// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::{ADMIN_RESULTS_LIMIT, DASHBOARD_ACTIVITY_LIMIT},
    error::AppError,
    models::{quiz::UpsertQuizRequest, user::DashboardStats},
    repositories::{quizzes, results},
    utils::jwt::Claims,
};

fn validate_quiz(payload: &UpsertQuizRequest) -> Result<(), AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload.check_answer_keys().map_err(AppError::BadRequest)
}

/// Creates a quiz with its questions.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpsertQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    validate_quiz(&payload)?;

    let id = quizzes::create_quiz(&pool, claims.user_id()?, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tracing::info!(quiz_id = id, questions = payload.questions.len(), "Quiz created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Full quiz definition including answer keys, for editing.
/// Admin only.
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

    Ok(Json(quiz))
}

/// Replaces a quiz's metadata and questions.
/// Admin only. Stored results keep their own snapshot.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    payload: Result<Json<UpsertQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    validate_quiz(&payload)?;

    let updated = quizzes::replace_quiz(&pool, id, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update quiz {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    if !updated {
        return Err(AppError::NotFound(format!("Quiz {} not found", id)));
    }

    Ok(Json(serde_json::json!({"message": "Quiz updated successfully"})))
}

/// Deletes a quiz by ID.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = quizzes::delete_quiz(&pool, id).await.map_err(|e| {
        tracing::error!("Failed to delete quiz {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if !deleted {
        return Err(AppError::NotFound(format!("Quiz {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Most recent results across all users.
/// Admin only.
pub async fn list_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = results::recent(&pool, ADMIN_RESULTS_LIMIT).await.map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

/// Platform totals, latest attempts and per-category numbers.
/// Admin only.
pub async fn get_dashboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let totals = results::totals(&pool).await?;
    let recent_activity = results::recent(&pool, DASHBOARD_ACTIVITY_LIMIT).await?;
    let category_stats = results::category_stats(&pool).await?;

    Ok(Json(DashboardStats {
        totals,
        recent_activity,
        category_stats,
    }))
}
