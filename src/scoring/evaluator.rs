// src/scoring/evaluator.rs

//! Per-question correctness policies.
//!
//! Every function here is total: a malformed answer is scored as incorrect,
//! it never fails the submission.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::models::question::{AnswerKey, Policy, Question};

/// A raw JSON answer interpreted according to the question's policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedAnswer {
    /// `null`, absent, blank text or an empty selection.
    Missing,
    /// Present but not in a shape the policy understands.
    Malformed,
    Choice(usize),
    Choices(BTreeSet<usize>),
    Flag(bool),
    Pairs(BTreeMap<usize, usize>),
    Sequence(Vec<String>),
    Text(String),
}

impl SubmittedAnswer {
    pub fn interpret(policy: Policy, raw: &Value) -> Self {
        if raw.is_null() {
            return SubmittedAnswer::Missing;
        }

        let parsed = match policy {
            Policy::SingleChoice => as_index(raw).map(SubmittedAnswer::Choice),
            Policy::MultipleChoice => match raw {
                Value::Array(items) if items.is_empty() => Some(SubmittedAnswer::Missing),
                Value::Array(items) => items
                    .iter()
                    .map(as_index)
                    .collect::<Option<BTreeSet<_>>>()
                    .map(SubmittedAnswer::Choices),
                _ => None,
            },
            Policy::TrueFalse => as_flag(raw).map(SubmittedAnswer::Flag),
            Policy::Matching => as_pairs(raw).map(|pairs| {
                if pairs.is_empty() {
                    SubmittedAnswer::Missing
                } else {
                    SubmittedAnswer::Pairs(pairs)
                }
            }),
            Policy::Ordering => match raw {
                Value::Array(items) if items.is_empty() => Some(SubmittedAnswer::Missing),
                Value::Array(items) => items
                    .iter()
                    .map(as_text)
                    .collect::<Option<Vec<_>>>()
                    .map(SubmittedAnswer::Sequence),
                _ => None,
            },
            Policy::ShortAnswer => as_text(raw).map(|text| {
                if text.trim().is_empty() {
                    SubmittedAnswer::Missing
                } else {
                    SubmittedAnswer::Text(text)
                }
            }),
        };

        parsed.unwrap_or(SubmittedAnswer::Malformed)
    }
}

/// Decides correctness of one interpreted answer against the stored key.
pub fn is_correct(key: &AnswerKey, answer: &SubmittedAnswer) -> bool {
    match key {
        AnswerKey::SingleChoice { correct } => {
            matches!(answer, SubmittedAnswer::Choice(idx) if idx == correct)
        }
        // Exact set equality: a subset or superset earns nothing.
        AnswerKey::MultipleChoice { correct } => {
            matches!(answer, SubmittedAnswer::Choices(chosen) if chosen == correct)
        }
        AnswerKey::TrueFalse { correct } => {
            matches!(answer, SubmittedAnswer::Flag(flag) if flag == correct)
        }
        AnswerKey::Matching { pairs } => {
            matches!(answer, SubmittedAnswer::Pairs(submitted) if submitted == pairs)
        }
        AnswerKey::Ordering { sequence } => match answer {
            SubmittedAnswer::Sequence(items) => {
                items.len() == sequence.len()
                    && items
                        .iter()
                        .zip(sequence)
                        .all(|(given, expected)| given.trim() == expected.trim())
            }
            _ => false,
        },
        AnswerKey::ShortAnswer {
            accepted,
            case_sensitive,
        } => match answer {
            SubmittedAnswer::Text(text) => {
                let given = normalize(text, *case_sensitive);
                accepted
                    .iter()
                    .filter(|candidate| !candidate.trim().is_empty())
                    .any(|candidate| normalize(candidate, *case_sensitive) == given)
            }
            _ => false,
        },
    }
}

/// Outcome of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    /// Full question points when correct, otherwise zero.
    pub earned_points: i32,
}

pub fn evaluate(question: &Question, raw: &Value) -> Evaluation {
    let answer = SubmittedAnswer::interpret(question.answer_key.policy(), raw);
    let is_correct = is_correct(&question.answer_key, &answer);

    Evaluation {
        is_correct,
        earned_points: if is_correct { question.points } else { 0 },
    }
}

/// Evaluates answers positionally. Missing trailing answers count as `null`.
pub fn evaluate_all(questions: &[Question], answers: &[Value]) -> Vec<Evaluation> {
    questions
        .iter()
        .enumerate()
        .map(|(idx, question)| evaluate(question, answers.get(idx).unwrap_or(&Value::Null)))
        .collect()
}

fn normalize(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `[[left, right], ...]`, `[{"left": l, "right": r}, ...]`, a flat
/// `[right, ...]` indexed by left position, or `{"left": right}`.
fn as_pairs(value: &Value) -> Option<BTreeMap<usize, usize>> {
    let mut pairs = BTreeMap::new();

    match value {
        Value::Array(items) => {
            for (position, item) in items.iter().enumerate() {
                let (left, right) = match item {
                    Value::Array(pair) if pair.len() == 2 => {
                        (as_index(&pair[0])?, as_index(&pair[1])?)
                    }
                    Value::Object(obj) => {
                        (as_index(obj.get("left")?)?, as_index(obj.get("right")?)?)
                    }
                    other => (position, as_index(other)?),
                };
                insert_pair(&mut pairs, left, right)?;
            }
        }
        Value::Object(map) => {
            for (left, right) in map {
                let left = left.trim().parse::<usize>().ok()?;
                insert_pair(&mut pairs, left, as_index(right)?)?;
            }
        }
        _ => return None,
    }

    Some(pairs)
}

/// Rejects a left item mapped to two different right items.
fn insert_pair(pairs: &mut BTreeMap<usize, usize>, left: usize, right: usize) -> Option<()> {
    match pairs.insert(left, right) {
        Some(previous) if previous != right => None,
        _ => Some(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use serde_json::json;

    fn question(question_type: QuestionType, answer_key: AnswerKey, points: i32) -> Question {
        Question {
            id: 1,
            position: 1,
            question_type,
            content: "Q".to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            image_url: None,
            points,
            explanation: None,
            answer_key,
        }
    }

    fn correct(q: &Question, raw: Value) -> bool {
        evaluate(q, &raw).is_correct
    }

    #[test]
    fn single_choice_matches_index() {
        let q = question(QuestionType::Single, AnswerKey::SingleChoice { correct: 1 }, 1);
        assert!(correct(&q, json!(1)));
        assert!(!correct(&q, json!(0)));
        assert!(!correct(&q, json!(null)));
        assert!(!correct(&q, json!("1")));
        assert!(!correct(&q, json!(-1)));
        assert!(!correct(&q, json!([1])));
    }

    #[test]
    fn single_choice_aliases_use_same_policy() {
        for t in [
            QuestionType::SingleImage,
            QuestionType::GraphTable,
            QuestionType::TextBased,
        ] {
            let q = question(t, AnswerKey::SingleChoice { correct: 2 }, 1);
            assert!(correct(&q, json!(2)));
            assert!(!correct(&q, json!(3)));
        }
    }

    #[test]
    fn multiple_choice_requires_exact_set() {
        let q = question(
            QuestionType::Multiple,
            AnswerKey::MultipleChoice {
                correct: [0, 2].into_iter().collect(),
            },
            1,
        );
        assert!(correct(&q, json!([0, 2])));
        assert!(correct(&q, json!([2, 0])));
        assert!(!correct(&q, json!([0])));
        assert!(!correct(&q, json!([0, 1, 2])));
        assert!(!correct(&q, json!([])));
        assert!(!correct(&q, json!(0)));
        assert!(!correct(&q, json!([0, "two"])));
    }

    #[test]
    fn true_false_accepts_bool_or_string() {
        let q = question(QuestionType::TrueFalse, AnswerKey::TrueFalse { correct: false }, 1);
        assert!(correct(&q, json!(false)));
        assert!(correct(&q, json!(" False ")));
        assert!(!correct(&q, json!(true)));
        assert!(!correct(&q, json!("no")));
        assert!(!correct(&q, json!(0)));
    }

    #[test]
    fn matching_requires_every_pair() {
        let q = question(
            QuestionType::Matching,
            AnswerKey::Matching {
                pairs: [(0, 2), (1, 0), (2, 1)].into_iter().collect(),
            },
            3,
        );
        assert!(correct(&q, json!([[0, 2], [1, 0], [2, 1]])));
        assert!(correct(&q, json!([2, 0, 1])));
        assert!(correct(&q, json!({"0": 2, "1": 0, "2": 1})));
        assert!(correct(
            &q,
            json!([
                {"left": 1, "right": 0},
                {"left": 0, "right": 2},
                {"left": 2, "right": 1}
            ])
        ));

        // Two of three right is still wrong.
        assert!(!correct(&q, json!([[0, 2], [1, 0], [2, 0]])));
        assert!(!correct(&q, json!([[0, 2], [1, 0]])));
        assert!(!correct(&q, json!([[0, 2], [0, 1], [1, 0], [2, 1]])));
        assert!(!correct(&q, json!("0-2")));
    }

    #[test]
    fn ordering_compares_position_by_position() {
        let q = question(
            QuestionType::Ordering,
            AnswerKey::Ordering {
                sequence: vec!["Rus".into(), "Hetmanate".into(), "UNR".into()],
            },
            2,
        );
        assert!(correct(&q, json!(["Rus", " Hetmanate", "UNR"])));
        assert!(!correct(&q, json!(["Hetmanate", "Rus", "UNR"])));
        assert!(!correct(&q, json!(["Rus", "Hetmanate"])));
        assert!(!correct(&q, json!([])));
    }

    #[test]
    fn short_answer_is_case_insensitive_by_default() {
        let q = question(
            QuestionType::ShortAnswer,
            AnswerKey::ShortAnswer {
                accepted: vec!["Kyiv".into(), "kyiv".into()],
                case_sensitive: false,
            },
            1,
        );
        assert!(correct(&q, json!("KYIV")));
        assert!(correct(&q, json!("  kyiv ")));
        assert!(!correct(&q, json!("Kiev")));
        assert!(!correct(&q, json!("   ")));
    }

    #[test]
    fn short_answer_honours_case_sensitive_flag_and_match_any() {
        let q = question(
            QuestionType::ShortAnswer,
            AnswerKey::ShortAnswer {
                accepted: vec!["H2O".into(), "water".into()],
                case_sensitive: true,
            },
            1,
        );
        assert!(correct(&q, json!("H2O")));
        assert!(correct(&q, json!("water")));
        assert!(!correct(&q, json!("h2o")));
        assert!(!correct(&q, json!("Water")));
    }

    #[test]
    fn numeric_short_answers_are_stringified() {
        let q = question(
            QuestionType::ShortAnswer,
            AnswerKey::ShortAnswer {
                accepted: vec!["1991".into()],
                case_sensitive: false,
            },
            1,
        );
        assert!(correct(&q, json!(1991)));
    }

    #[test]
    fn whitespace_only_text_is_missing() {
        assert_eq!(
            SubmittedAnswer::interpret(Policy::ShortAnswer, &json!(" \t\n")),
            SubmittedAnswer::Missing
        );
        assert_eq!(
            SubmittedAnswer::interpret(Policy::ShortAnswer, &json!({"text": "x"})),
            SubmittedAnswer::Malformed
        );
    }

    #[test]
    fn points_are_all_or_nothing() {
        let q = question(
            QuestionType::Matching,
            AnswerKey::Matching {
                pairs: [(0, 0), (1, 1)].into_iter().collect(),
            },
            5,
        );
        assert_eq!(evaluate(&q, &json!([0, 1])).earned_points, 5);
        assert_eq!(evaluate(&q, &json!([0, 0])).earned_points, 0);
    }

    #[test]
    fn evaluate_all_treats_missing_entries_as_null() {
        let questions = vec![
            question(QuestionType::Single, AnswerKey::SingleChoice { correct: 0 }, 1),
            question(QuestionType::Single, AnswerKey::SingleChoice { correct: 1 }, 1),
        ];
        let outcomes = evaluate_all(&questions, &[json!(0)]);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_correct);
        assert!(!outcomes[1].is_correct);
    }
}
