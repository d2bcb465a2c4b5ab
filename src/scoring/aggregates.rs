// src/scoring/aggregates.rs

//! Transactional write path: one result row plus both rollups, all or nothing.

use sqlx::{PgPool, Postgres, Transaction, types::Json};

use crate::{
    models::quiz::QuizDefinition,
    scoring::{SubmissionError, TransactionLimits, assembler::AssembledResult},
};

/// State of both aggregates right after the commit.
#[derive(Debug, Clone)]
pub struct CommittedResult {
    pub result_id: i64,
    pub user_tests_completed: i32,
    pub user_total_score: i64,
    pub user_average_score: f64,
    pub quiz_times_taken: i32,
    pub quiz_average_score: f64,
}

#[derive(sqlx::FromRow)]
struct UserTotals {
    tests_completed: i32,
    total_score: i64,
    average_score: f64,
}

#[derive(sqlx::FromRow)]
struct QuizTotals {
    times_taken: i32,
    average_score: f64,
}

/// Writes the result and updates the user and quiz rollups in one transaction.
///
/// Lock order is always quiz row, then user row. The quiz lock is taken in its own
/// statement before the average is recomputed, so under READ COMMITTED the
/// recomputation sees every result committed by earlier holders of that lock.
pub async fn record_submission(
    pool: &PgPool,
    limits: TransactionLimits,
    user_id: i64,
    user_agent: Option<&str>,
    quiz: &QuizDefinition,
    result: &AssembledResult,
) -> Result<CommittedResult, SubmissionError> {
    let mut tx = pool.begin().await?;
    apply_limits(&mut tx, limits).await?;

    let quiz_locked =
        sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(quiz.id)
            .fetch_optional(&mut *tx)
            .await?;
    if quiz_locked.is_none() {
        return Err(SubmissionError::NotFound(format!(
            "Quiz {} was removed before the result could be saved",
            quiz.id
        )));
    }

    let user_locked =
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if user_locked.is_none() {
        return Err(SubmissionError::NotFound(format!("User {} not found", user_id)));
    }

    // 1. Immutable result row.
    let result_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO test_results (
            user_id, quiz_id, quiz_title, score, correct_answers, total_questions,
            earned_points, total_points, passed, time_spent, snapshot,
            category, difficulty, user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(quiz.id)
    .bind(&quiz.title)
    .bind(result.score)
    .bind(result.correct_count)
    .bind(result.total_questions)
    .bind(result.earned_points)
    .bind(result.total_points)
    .bind(result.passed)
    .bind(result.time_spent)
    .bind(Json(result.snapshot.clone()))
    .bind(&quiz.category)
    .bind(&quiz.difficulty)
    .bind(user_agent)
    .fetch_one(&mut *tx)
    .await?;

    // 2. User rollup. SET expressions see the pre-update row, so the average is
    // derived from the incremented totals in the same statement.
    let user = sqlx::query_as::<_, UserTotals>(
        r#"
        UPDATE users SET
            tests_completed = tests_completed + 1,
            total_score = total_score + $1,
            average_score = (total_score + $1)::DOUBLE PRECISION / (tests_completed + 1)
        WHERE id = $2
        RETURNING tests_completed, total_score, average_score
        "#,
    )
    .bind(i64::from(result.score))
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    // 3. Quiz rollup, average recomputed over every stored result for the quiz.
    let quiz_totals = sqlx::query_as::<_, QuizTotals>(
        r#"
        UPDATE quizzes SET
            times_taken = times_taken + 1,
            average_score = COALESCE(
                (SELECT AVG(score)::DOUBLE PRECISION FROM test_results WHERE quiz_id = $1),
                0
            )
        WHERE id = $1
        RETURNING times_taken, average_score
        "#,
    )
    .bind(quiz.id)
    .fetch_one(&mut *tx)
    .await?;

    // 4. Any `?` above drops `tx`, which rolls all of it back.
    tx.commit().await?;

    Ok(CommittedResult {
        result_id,
        user_tests_completed: user.tests_completed,
        user_total_score: user.total_score,
        user_average_score: user.average_score,
        quiz_times_taken: quiz_totals.times_taken,
        quiz_average_score: quiz_totals.average_score,
    })
}

/// Bounds how long the transaction may wait on locks or run a statement.
/// `SET LOCAL` cannot take bind parameters; both values are integers.
async fn apply_limits(
    tx: &mut Transaction<'_, Postgres>,
    limits: TransactionLimits,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "SET LOCAL statement_timeout = {}",
        limits.statement_timeout_ms
    ))
    .execute(&mut **tx)
    .await?;
    sqlx::query(&format!("SET LOCAL lock_timeout = {}", limits.lock_timeout_ms))
        .execute(&mut **tx)
        .await?;
    Ok(())
}
