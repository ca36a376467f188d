//! Attempt session endpoints: start, submit, complete.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use medexam_core::attempt::{
    ensure_owner, recompute_totals, score_answer, select_questions, submit_feedback, summarize,
    SessionQuestion,
};
use medexam_core::error::CoreError;
use medexam_core::model::AttemptMode;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartRequest {
    pub exam_id: String,
    pub mode: String,
    #[serde(default)]
    pub topic_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub question_id: String,
    pub user_answer: String,
    #[serde(default)]
    pub time_spent_seconds: i64,
}

pub async fn start(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(req): Json<StartRequest>,
) -> Result<Json<Value>, ApiError> {
    let mode: AttemptMode = req.mode.parse().map_err(CoreError::Validation)?;
    state
        .store
        .get_exam(&req.exam_id)?
        .ok_or(CoreError::NotFound("exam"))?;

    let pool = state.store.published_questions(&req.exam_id, &req.topic_ids)?;
    let selected = select_questions(pool, mode, &mut rand::thread_rng());

    let attempt = state
        .store
        .create_attempt(&ctx.user_id, &req.exam_id, mode, selected.len() as i64)?;

    let questions: Vec<SessionQuestion> = selected
        .into_iter()
        .map(|q| SessionQuestion::for_mode(q, mode))
        .collect();

    tracing::info!(
        attempt_id = %attempt.id,
        %mode,
        questions = questions.len(),
        "attempt started"
    );
    Ok(Json(json!({
        "attempt_id": attempt.id,
        "started_at": attempt.started_at,
        "questions": questions,
    })))
}

pub async fn submit(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Auth(ctx): Auth,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<Value>, ApiError> {
    let attempt = state
        .store
        .get_attempt(&attempt_id)?
        .ok_or(CoreError::NotFound("attempt"))?;
    ensure_owner(&attempt, &ctx)?;

    let question = state
        .store
        .get_question(&req.question_id)?
        .ok_or(CoreError::NotFound("question"))?;

    let is_correct = score_answer(&question.correct_answer, &req.user_answer);
    state.store.insert_item(
        &attempt.id,
        &question.id,
        &req.user_answer,
        is_correct,
        req.time_spent_seconds,
    )?;

    // Aggregates are always the sum over every item, so out-of-order and
    // duplicate submissions converge to the true totals.
    let items = state.store.items_for_attempt(&attempt.id)?;
    state
        .store
        .update_aggregates(&attempt.id, &recompute_totals(&items))?;

    let feedback = submit_feedback(attempt.mode, is_correct, &question);
    Ok(Json(serde_json::to_value(feedback).map_err(|e| {
        CoreError::Internal(anyhow::Error::new(e).context("serializing feedback"))
    })?))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Auth(ctx): Auth,
) -> Result<Json<Value>, ApiError> {
    let attempt = state
        .store
        .get_attempt(&attempt_id)?
        .ok_or(CoreError::NotFound("attempt"))?;
    ensure_owner(&attempt, &ctx)?;

    let items = state.store.items_for_attempt(&attempt.id)?;
    let summary = summarize(&items);
    // Finalize is a no-op on an already-completed attempt; the summary is
    // recomputed from the same items either way.
    state
        .store
        .finalize_attempt(&attempt.id, &recompute_totals(&items))?;

    tracing::info!(attempt_id = %attempt.id, percentage = summary.percentage, "attempt completed");
    Ok(Json(json!({"summary": summary})))
}
