// src/repositories/results.rs

//! Read side of results and aggregates. Nothing here writes.

use sqlx::PgPool;

use crate::models::{
    test_result::{ResultSummary, TestResult},
    user::{CategoryStat, LeaderboardEntry, PlatformTotals, UserAggregate},
};

const SUMMARY_SELECT: &str = r#"
    SELECT
        r.id, r.user_id, u.username, r.quiz_id, r.quiz_title, r.score,
        r.correct_answers, r.total_questions, r.passed, r.time_spent, r.category,
        r.completed_at
    FROM test_results r
    JOIN users u ON u.id = r.user_id
"#;

pub async fn find_user_aggregate(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<UserAggregate>, sqlx::Error> {
    sqlx::query_as::<_, UserAggregate>(
        r#"
        SELECT id, username, tests_completed, total_score, average_score
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Most recent results of one user, newest first.
pub async fn recent_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ResultSummary>, sqlx::Error> {
    sqlx::query_as::<_, ResultSummary>(&format!(
        "{SUMMARY_SELECT} WHERE r.user_id = $1 ORDER BY r.completed_at DESC, r.id DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Most recent results across all users, newest first.
pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<ResultSummary>, sqlx::Error> {
    sqlx::query_as::<_, ResultSummary>(&format!(
        "{SUMMARY_SELECT} ORDER BY r.completed_at DESC, r.id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// A result together with its frozen snapshot. `None` unless it belongs to `user_id`.
pub async fn find_for_user(
    pool: &PgPool,
    user_id: i64,
    result_id: i64,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(
        r#"
        SELECT
            id, user_id, quiz_id, quiz_title, score, correct_answers, total_questions,
            earned_points, total_points, passed, time_spent, snapshot,
            category, difficulty, completed_at
        FROM test_results
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(result_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Users with at least one completed test, best average first.
pub async fn leaderboard(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT id AS user_id, username, tests_completed, average_score, total_score
        FROM users
        WHERE tests_completed > 0
        ORDER BY average_score DESC, tests_completed DESC, id
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn totals(pool: &PgPool) -> Result<PlatformTotals, sqlx::Error> {
    sqlx::query_as::<_, PlatformTotals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM test_results) AS total_results,
            (SELECT COUNT(*) FROM users WHERE tests_completed > 0) AS active_users,
            (SELECT COUNT(*) FROM quizzes) AS total_quizzes,
            COALESCE((SELECT AVG(score)::DOUBLE PRECISION FROM test_results), 0) AS average_score
        "#,
    )
    .fetch_one(pool)
    .await
}

/// Results grouped by the category copied onto each row, busiest first.
/// Rows written without a category are left out.
pub async fn category_stats(pool: &PgPool) -> Result<Vec<CategoryStat>, sqlx::Error> {
    sqlx::query_as::<_, CategoryStat>(
        r#"
        SELECT
            category,
            COUNT(*) AS count,
            AVG(score)::DOUBLE PRECISION AS average_score
        FROM test_results
        WHERE category IS NOT NULL
        GROUP BY category
        ORDER BY count DESC, category
        "#,
    )
    .fetch_all(pool)
    .await
}
