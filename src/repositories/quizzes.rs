// src/repositories/quizzes.rs

use sqlx::{PgPool, Postgres, Transaction, types::Json};

use crate::{
    models::{
        question::{AnswerKey, CreateQuestionRequest, Question, QuestionRow},
        quiz::{QuizDefinition, QuizRow, QuizSummary, UpsertQuizRequest},
    },
    utils::html::clean_html,
};

const QUIZ_COLUMNS: &str =
    "id, title, description, category, difficulty, time_limit, passing_score";

const QUESTION_COLUMNS: &str = "\
    id, position, question_type, content, options, image_url, points, explanation, answer_key";

/// Reads a quiz and its ordered questions as one consistent snapshot.
///
/// Both reads share a REPEATABLE READ, READ ONLY transaction so a concurrent edit
/// cannot produce a header from one version and questions from another.
pub async fn load_definition(
    pool: &PgPool,
    quiz_id: i64,
) -> Result<Option<QuizDefinition>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let Some(row) = sqlx::query_as::<_, QuizRow>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
    ))
    .bind(quiz_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {QUESTION_COLUMNS}
         FROM questions
         WHERE quiz_id = $1
         ORDER BY position, id"
    ))
    .bind(quiz_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let questions = rows
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(Some(QuizDefinition::from_parts(row, questions)))
}

pub async fn list_summaries(pool: &PgPool) -> Result<Vec<QuizSummary>, sqlx::Error> {
    sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT
            q.id, q.title, q.description, q.category, q.difficulty,
            q.time_limit, q.passing_score,
            (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count,
            q.times_taken, q.average_score
        FROM quizzes q
        ORDER BY q.created_at DESC, q.id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Inserts a quiz with its questions. Returns the new quiz id.
pub async fn create_quiz(
    pool: &PgPool,
    created_by: i64,
    req: &UpsertQuizRequest,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (
            title, description, category, difficulty, time_limit, passing_score, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(req.title.trim())
    .bind(req.description.as_deref().map(clean_html))
    .bind(&req.category)
    .bind(&req.difficulty)
    .bind(req.time_limit)
    .bind(req.passing_score)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    insert_questions(&mut tx, quiz_id, &req.questions).await?;

    tx.commit().await?;
    Ok(quiz_id)
}

/// Replaces a quiz's metadata and questions. Aggregates and stored results are untouched.
/// Returns `false` when the quiz does not exist.
pub async fn replace_quiz(
    pool: &PgPool,
    quiz_id: i64,
    req: &UpsertQuizRequest,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE quizzes SET
            title = $1, description = $2, category = $3, difficulty = $4,
            time_limit = $5, passing_score = $6, updated_at = CURRENT_TIMESTAMP
        WHERE id = $7
        "#,
    )
    .bind(req.title.trim())
    .bind(req.description.as_deref().map(clean_html))
    .bind(&req.category)
    .bind(&req.difficulty)
    .bind(req.time_limit)
    .bind(req.passing_score)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    insert_questions(&mut tx, quiz_id, &req.questions).await?;

    tx.commit().await?;
    Ok(true)
}

/// Deletes a quiz and its questions. Stored results keep their snapshot and lose the link.
pub async fn delete_quiz(pool: &PgPool, quiz_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_questions(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    questions: &[CreateQuestionRequest],
) -> Result<(), sqlx::Error> {
    for (idx, question) in questions.iter().enumerate() {
        let options: Vec<String> = question
            .options
            .iter()
            .map(|o| clean_html(o.as_str()))
            .collect();

        sqlx::query(
            r#"
            INSERT INTO questions (
                quiz_id, position, question_type, content, options,
                image_url, points, explanation, answer_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(quiz_id)
        .bind(idx as i32 + 1)
        .bind(question.question_type.as_str())
        .bind(clean_html(&question.content))
        .bind(Json(options))
        .bind(&question.image_url)
        .bind(question.points)
        .bind(question.explanation.as_deref().map(clean_html))
        .bind(Json(sanitize_answer_key(&question.answer_key)))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Ordering items are shown to takers, so they get the same cleaning as options.
/// Short-answer strings are only compared, never rendered as HTML, and stay verbatim.
fn sanitize_answer_key(key: &AnswerKey) -> AnswerKey {
    match key {
        AnswerKey::Ordering { sequence } => AnswerKey::Ordering {
            sequence: sequence.iter().map(|item| clean_html(item)).collect(),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_items_are_cleaned() {
        let key = AnswerKey::Ordering {
            sequence: vec![
                "<b>First</b>".to_string(),
                "Second<script>alert(1)</script>".to_string(),
            ],
        };

        assert_eq!(
            sanitize_answer_key(&key),
            AnswerKey::Ordering {
                sequence: vec!["<b>First</b>".to_string(), "Second".to_string()],
            }
        );
    }

    #[test]
    fn other_keys_are_stored_verbatim() {
        let key = AnswerKey::ShortAnswer {
            accepted: vec!["a < b".to_string()],
            case_sensitive: false,
        };
        assert_eq!(sanitize_answer_key(&key), key);
    }
}
