// src/scoring/assembler.rs

use crate::{
    models::test_result::{QuestionSnapshot, ResultSnapshot},
    scoring::{evaluator::Evaluation, validator::ValidatedSubmission},
};

/// Everything the aggregate updater needs to write one result row.
#[derive(Debug, Clone)]
pub struct AssembledResult {
    pub score: i32,
    pub correct_count: i32,
    pub total_questions: i32,
    pub earned_points: i32,
    pub total_points: i32,
    pub passed: bool,
    pub time_spent: i32,
    pub snapshot: ResultSnapshot,
}

/// `round(earned / total * 100)` in integer arithmetic, half rounding up.
/// A quiz worth zero points scores zero.
pub fn score_percent(earned: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let earned = earned.clamp(0, total);
    ((earned * 200 + total) / (total * 2)) as i32
}

/// Folds per-question evaluations into the score and freezes the review snapshot.
///
/// The snapshot copies question text, options and keys out of the definition read
/// for this submission, so later edits to the quiz cannot change it.
pub fn assemble(submission: &ValidatedSubmission, evaluations: &[Evaluation]) -> AssembledResult {
    let quiz = &submission.quiz;

    let mut earned: i64 = 0;
    let mut total: i64 = 0;
    let mut correct_count: i32 = 0;
    let mut questions = Vec::with_capacity(quiz.questions.len());

    for (idx, (question, evaluation)) in quiz.questions.iter().zip(evaluations).enumerate() {
        total += i64::from(question.points);
        if evaluation.is_correct {
            earned += i64::from(question.points);
            correct_count += 1;
        }

        questions.push(QuestionSnapshot {
            question_id: question.id,
            position: question.position,
            question_type: question.question_type,
            content: question.content.clone(),
            options: question.options.clone(),
            image_url: question.image_url.clone(),
            explanation: question.explanation.clone(),
            points: question.points,
            user_answer: submission
                .answers
                .get(idx)
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            correct_answer: question.answer_key.clone(),
            is_correct: evaluation.is_correct,
            earned_points: evaluation.earned_points,
        });
    }

    let score = score_percent(earned, total);
    let earned_points = i32::try_from(earned).unwrap_or(i32::MAX);
    let total_points = i32::try_from(total).unwrap_or(i32::MAX);

    AssembledResult {
        score,
        correct_count,
        total_questions: i32::try_from(quiz.questions.len()).unwrap_or(i32::MAX),
        earned_points,
        total_points,
        passed: score >= quiz.passing_score,
        time_spent: submission.time_spent,
        snapshot: ResultSnapshot {
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            passing_score: quiz.passing_score,
            earned_points,
            total_points,
            questions,
        },
    }
}
