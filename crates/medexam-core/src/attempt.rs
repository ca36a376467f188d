//! Attempt session logic: question selection, scoring, and aggregates.
//!
//! Everything here is deterministic given its inputs (the shuffle takes the
//! RNG as a parameter), which keeps the session rules testable without a
//! database. The storage layer persists the rows; the HTTP layer shapes the
//! responses out of the types below.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::model::{Attempt, AttemptItem, AttemptMode, AuthContext, Question};

/// Exam-mode selections are capped; study mode returns the full filtered
/// set since it is meant for untimed review.
pub const EXAM_MODE_QUESTION_CAP: usize = 50;

/// A question as delivered to an active session, with answer and
/// explanations included. Study mode only.
#[derive(Debug, Clone, Serialize)]
pub struct FullQuestion {
    pub id: String,
    pub stem: String,
    pub options: Vec<crate::model::AnswerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_option_explanations: Option<Value>,
}

/// A question with the answer and explanation fields stripped entirely.
/// The type has no such fields, so exam-mode payloads cannot leak them.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedQuestion {
    pub id: String,
    pub stem: String,
    pub options: Vec<crate::model::AnswerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

/// Mode-dependent session payload for one question.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SessionQuestion {
    Full(FullQuestion),
    Redacted(RedactedQuestion),
}

impl SessionQuestion {
    pub fn for_mode(q: Question, mode: AttemptMode) -> Self {
        match mode {
            AttemptMode::Study => SessionQuestion::Full(FullQuestion {
                id: q.id,
                stem: q.stem,
                options: q.options,
                difficulty_level: q.difficulty_level,
                topic_id: q.topic_id,
                correct_answer: q.correct_answer,
                per_option_explanations: q.per_option_explanations,
            }),
            AttemptMode::Exam => SessionQuestion::Redacted(RedactedQuestion {
                id: q.id,
                stem: q.stem,
                options: q.options,
                difficulty_level: q.difficulty_level,
                topic_id: q.topic_id,
            }),
        }
    }
}

/// Shuffle the published pool and, in exam mode, cap the selection.
pub fn select_questions<R: Rng>(
    mut pool: Vec<Question>,
    mode: AttemptMode,
    rng: &mut R,
) -> Vec<Question> {
    pool.shuffle(rng);
    if mode == AttemptMode::Exam {
        pool.truncate(EXAM_MODE_QUESTION_CAP);
    }
    pool
}

/// Exact, case-sensitive answer comparison. Fixed at submit time; never
/// re-derived later, so historical correctness survives question edits.
pub fn score_answer(correct_answer: &str, user_answer: &str) -> bool {
    correct_answer == user_answer
}

/// Aggregates derived from an attempt's full item set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptTotals {
    pub total: i64,
    pub correct: i64,
    pub time_spent_seconds: i64,
}

/// Recompute aggregates by summing all items. Deliberately O(n) per write:
/// out-of-order or duplicated submissions still converge to the true sum,
/// with no incremental-counter bookkeeping to race.
pub fn recompute_totals(items: &[AttemptItem]) -> AttemptTotals {
    AttemptTotals {
        total: items.len() as i64,
        correct: items.iter().filter(|i| i.is_correct).count() as i64,
        time_spent_seconds: items.iter().map(|i| i.time_spent_seconds).sum(),
    }
}

/// Final summary returned by completion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttemptSummary {
    pub total: i64,
    pub correct: i64,
    pub percentage: i64,
    pub time_spent_seconds: i64,
}

/// Summarize an attempt from its items. Repeating this over the same item
/// set yields the same summary, which is what makes completion idempotent.
pub fn summarize(items: &[AttemptItem]) -> AttemptSummary {
    let totals = recompute_totals(items);
    AttemptSummary {
        total: totals.total,
        correct: totals.correct,
        percentage: percentage(totals.correct, totals.total),
        time_spent_seconds: totals.time_spent_seconds,
    }
}

/// `round(correct / total * 100)`, defined as 0 when total is 0.
pub fn percentage(correct: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as i64
    }
}

/// Per-item feedback returned by submit. Study mode carries the correct
/// answer and explanation for immediate feedback; exam mode carries
/// neither, preserving the answer-hiding contract until completion.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitFeedback {
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Value>,
}

pub fn submit_feedback(mode: AttemptMode, is_correct: bool, question: &Question) -> SubmitFeedback {
    match mode {
        AttemptMode::Study => SubmitFeedback {
            is_correct,
            correct_answer: Some(question.correct_answer.clone()),
            explanation: question.per_option_explanations.clone(),
        },
        AttemptMode::Exam => SubmitFeedback {
            is_correct,
            correct_answer: None,
            explanation: None,
        },
    }
}

/// Ownership check for attempt access. A mismatch is `NotFound`, not
/// `Forbidden`, so the response never confirms that someone else's attempt
/// exists.
pub fn ensure_owner(attempt: &Attempt, ctx: &AuthContext) -> CoreResult<()> {
    if attempt.user_id == ctx.user_id {
        Ok(())
    } else {
        Err(CoreError::NotFound("attempt"))
    }
}
