// src/state.rs

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{config::Config, scoring::TransactionLimits};

/// Shared handler state. Everything in here is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self { pool, config }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for TransactionLimits {
    fn from_ref(state: &AppState) -> Self {
        TransactionLimits::from(&state.config)
    }
}
