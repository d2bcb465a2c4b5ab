// src/models/user.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::models::test_result::ResultSummary;

/// Aggregate columns of the 'users' table.
/// Identity fields are owned by the identity service; only these are written here.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregate {
    pub id: i64,
    pub username: String,
    pub tests_completed: i32,
    pub total_score: i64,
    pub average_score: f64,
}

/// Response of the per-user statistics endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub stats: UserAggregate,
    pub recent_results: Vec<ResultSummary>,
}

/// Aggregated struct for displaying the leaderboard.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub tests_completed: i32,
    pub average_score: f64,
    pub total_score: i64,
}

/// Platform-wide totals.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTotals {
    pub total_results: i64,
    pub active_users: i64,
    pub total_quizzes: i64,
    pub average_score: f64,
}

/// Attempts and mean score per quiz category, from the category frozen on each result.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub average_score: f64,
}

/// Public statistics page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    #[serde(flatten)]
    pub totals: PlatformTotals,
    pub category_stats: Vec<CategoryStat>,
}

/// Admin dashboard: totals, latest attempts and the category breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(flatten)]
    pub totals: PlatformTotals,
    pub recent_activity: Vec<ResultSummary>,
    pub category_stats: Vec<CategoryStat>,
}
