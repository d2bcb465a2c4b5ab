// src/scoring/validator.rs

use serde_json::Value;
use sqlx::PgPool;

use crate::{
    models::{quiz::QuizDefinition, test_result::SubmitQuizRequest},
    repositories::quizzes,
    scoring::SubmissionError,
};

/// A submission whose shape matches the quiz it targets.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub quiz: QuizDefinition,
    /// One raw answer per question, in question order.
    pub answers: Vec<Value>,
    /// Seconds.
    pub time_spent: i32,
}

/// Loads the quiz snapshot and checks the payload against it.
pub async fn validate_submission(
    pool: &PgPool,
    quiz_id: i64,
    request: SubmitQuizRequest,
) -> Result<ValidatedSubmission, SubmissionError> {
    let quiz = quizzes::load_definition(pool, quiz_id)
        .await?
        .ok_or_else(|| SubmissionError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    check_payload(quiz, request)
}

/// Cardinality and `timeSpent` checks. Per-answer shapes are left to the evaluator.
pub fn check_payload(
    quiz: QuizDefinition,
    request: SubmitQuizRequest,
) -> Result<ValidatedSubmission, SubmissionError> {
    let answers = match request.answers {
        Value::Array(answers) => answers,
        Value::Null => {
            return Err(SubmissionError::Validation(
                "answers is required".to_string(),
            ));
        }
        _ => {
            return Err(SubmissionError::Validation(
                "answers must be an array".to_string(),
            ));
        }
    };

    if answers.len() != quiz.questions.len() {
        return Err(SubmissionError::Validation(format!(
            "Expected {} answers, got {}",
            quiz.questions.len(),
            answers.len()
        )));
    }

    let time_spent = parse_time_spent(request.time_spent.as_ref())?;

    Ok(ValidatedSubmission {
        quiz,
        answers,
        time_spent,
    })
}

/// Absent or `null` means zero. Fractions are rounded to whole seconds.
fn parse_time_spent(raw: Option<&Value>) -> Result<i32, SubmissionError> {
    let invalid = || {
        SubmissionError::Validation("timeSpent must be a non-negative number".to_string())
    };

    let seconds = match raw {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid)?,
        Some(_) => return Err(invalid()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    let rounded = seconds.round();
    if rounded > f64::from(i32::MAX) {
        return Err(SubmissionError::Validation(
            "timeSpent is too large".to_string(),
        ));
    }

    Ok(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerKey, Question, QuestionType};
    use serde_json::json;

    fn quiz_with(n: usize) -> QuizDefinition {
        let questions = (0..n)
            .map(|i| Question {
                id: i as i64 + 1,
                position: i as i32 + 1,
                question_type: QuestionType::Single,
                content: format!("Question {}", i),
                options: vec!["A".into(), "B".into()],
                image_url: None,
                points: 1,
                explanation: None,
                answer_key: AnswerKey::SingleChoice { correct: 0 },
            })
            .collect();

        QuizDefinition {
            id: 1,
            title: "Quiz".to_string(),
            description: None,
            category: "general".to_string(),
            difficulty: "medium".to_string(),
            time_limit: 60,
            passing_score: 60,
            questions,
        }
    }

    fn request(answers: Value, time_spent: Option<Value>) -> SubmitQuizRequest {
        SubmitQuizRequest {
            answers,
            time_spent,
        }
    }

    #[test]
    fn accepts_matching_cardinality() {
        let validated = check_payload(quiz_with(2), request(json!([1, null]), None)).unwrap();
        assert_eq!(validated.answers.len(), 2);
        assert_eq!(validated.time_spent, 0);
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = check_payload(quiz_with(2), request(json!([1]), None)).unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));

        let err = check_payload(quiz_with(2), request(json!([1, 0, 1]), None)).unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));
    }

    #[test]
    fn rejects_missing_or_non_array_answers() {
        assert!(matches!(
            check_payload(quiz_with(1), request(Value::Null, None)),
            Err(SubmissionError::Validation(_))
        ));
        assert!(matches!(
            check_payload(quiz_with(1), request(json!({"0": 1}), None)),
            Err(SubmissionError::Validation(_))
        ));
    }

    #[test]
    fn malformed_answers_pass_validation() {
        let validated =
            check_payload(quiz_with(2), request(json!([{"weird": true}, "x"]), None)).unwrap();
        assert_eq!(validated.answers[0], json!({"weird": true}));
    }

    #[test]
    fn time_spent_rules() {
        let ok = |v: Value| check_payload(quiz_with(1), request(json!([0]), Some(v)));

        assert_eq!(ok(json!(42)).unwrap().time_spent, 42);
        assert_eq!(ok(json!(12.6)).unwrap().time_spent, 13);
        assert_eq!(ok(Value::Null).unwrap().time_spent, 0);
        assert!(ok(json!(-1)).is_err());
        assert!(ok(json!("30")).is_err());
        assert!(ok(json!(true)).is_err());
        assert!(ok(json!(1e12)).is_err());
    }

    #[test]
    fn empty_quiz_accepts_empty_answers() {
        let validated = check_payload(quiz_with(0), request(json!([]), None)).unwrap();
        assert!(validated.answers.is_empty());
    }
}
