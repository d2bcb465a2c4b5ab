// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Points a question is worth when the author does not set a value.
pub const DEFAULT_QUESTION_POINTS: i32 = 1;

/// Passing threshold (percent) for quizzes created without one.
pub const DEFAULT_PASSING_SCORE: i32 = 60;

/// Number of entries returned by the public leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 10;

/// Number of recent results shown alongside a user's statistics.
pub const RECENT_RESULTS_LIMIT: i64 = 5;

/// Number of latest attempts shown on the admin dashboard.
pub const DASHBOARD_ACTIVITY_LIMIT: i64 = 10;

/// Number of rows returned by the admin results listing.
pub const ADMIN_RESULTS_LIMIT: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub max_connections: u32,
    /// `statement_timeout` applied inside every submission transaction.
    pub submit_statement_timeout_ms: u64,
    /// `lock_timeout` applied while waiting for aggregate row locks.
    pub submit_lock_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 86_400),
            rust_log,
            port: parse_or("PORT", 3000),
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            submit_statement_timeout_ms: parse_or("SUBMIT_STATEMENT_TIMEOUT_MS", 5_000),
            submit_lock_timeout_ms: parse_or("SUBMIT_LOCK_TIMEOUT_MS", 3_000),
        }
    }
}

/// Reads an optional numeric variable. Panics if it is set but unparsable.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a number, got '{}'", key, raw)),
        Err(_) => default,
    }
}
