// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    config::{LEADERBOARD_LIMIT, RECENT_RESULTS_LIMIT},
    error::AppError,
    models::user::{StatsOverview, UserStatsResponse},
    repositories::results,
    utils::jwt::Claims,
};

/// Users may read their own data; admins may read anyone's.
fn ensure_owner_or_admin(claims: &Claims, user_id: i64) -> Result<(), AppError> {
    if claims.is_admin() || claims.user_id()? == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only view your own results".to_string(),
        ))
    }
}

/// Aggregate statistics of a user plus their most recent attempts.
pub async fn get_user_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner_or_admin(&claims, user_id)?;

    let stats = results::find_user_aggregate(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let recent_results = results::recent_for_user(&pool, user_id, RECENT_RESULTS_LIMIT)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recent results: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(UserStatsResponse {
        stats,
        recent_results,
    }))
}

/// One stored attempt with its frozen review snapshot.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((user_id, result_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner_or_admin(&claims, user_id)?;

    let result = results::find_for_user(&pool, user_id, result_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    Ok(Json(result))
}

/// Top users by average score.
pub async fn get_leaderboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let leaderboard = results::leaderboard(&pool, LEADERBOARD_LIMIT)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(leaderboard))
}

/// Public totals with a per-category breakdown.
pub async fn get_overview(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let totals = results::totals(&pool).await.map_err(|e| {
        tracing::error!("Failed to fetch totals: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;
    let category_stats = results::category_stats(&pool).await?;

    Ok(Json(StatsOverview {
        totals,
        category_stats,
    }))
}
