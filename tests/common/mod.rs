// tests/common/mod.rs

#![allow(dead_code)]

use assessment::{config::Config, routes, state::AppState, utils::jwt::sign_jwt};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub pool: PgPool,
    pub client: reqwest::Client,
    pub config: Config,
}

/// Spawns the app on a random port against the database at `DATABASE_URL`.
///
/// Returns `None` (and the calling test should return early) when no database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        max_connections: 20,
        submit_statement_timeout_ms: 10_000,
        submit_lock_timeout_ms: 10_000,
    };

    let app = routes::create_router(AppState::new(pool.clone(), config.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
        config,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    /// Inserts a user row the way the identity service would and returns `(id, token)`.
    pub async fn create_user(&self, role: &str) -> (i64, String) {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..12]);
        let id: i64 =
            sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
                .bind(&username)
                .bind(role)
                .fetch_one(&self.pool)
                .await
                .expect("Failed to insert user");

        (id, self.token_for(id, role))
    }

    /// Signs a token the way the identity service would, with the configured lifetime.
    /// The user row is not required to exist.
    pub fn token_for(&self, user_id: i64, role: &str) -> String {
        sign_jwt(
            user_id,
            role,
            &self.config.jwt_secret,
            self.config.jwt_expiration,
        )
        .expect("Failed to sign token")
    }

    /// Creates a quiz through the admin API and returns its id.
    pub async fn create_quiz(&self, admin_token: &str, body: &Value) -> i64 {
        let response = self
            .client
            .post(self.url("/admin/quizzes"))
            .bearer_auth(admin_token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 201, "quiz creation failed");
        let created: Value = response.json().await.unwrap();
        created["id"].as_i64().expect("id missing")
    }

    pub async fn submit(&self, token: &str, quiz_id: i64, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/quizzes/{}/submit", quiz_id)))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A quiz of `n` single-choice questions, one point each, where option 1 is always correct.
pub fn single_choice_quiz(n: usize) -> Value {
    let questions: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "type": "single",
                "content": format!("Question {}", i + 1),
                "options": ["A", "B", "C"],
                "answerKey": {"kind": "single-choice", "correct": 1}
            })
        })
        .collect();

    json!({
        "title": format!("Quiz {}", &uuid::Uuid::new_v4().to_string()[..8]),
        "category": "testing",
        "difficulty": "easy",
        "passingScore": 60,
        "questions": questions
    })
}
