//! Review workflow endpoints: assign, approve, reject.
//!
//! The state machine and authorization live in `medexam_core::review`; each
//! handler loads the question, computes the update, persists it, and appends
//! the audit entry.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use medexam_core::error::CoreError;
use medexam_core::review;
use medexam_core::review::ReviewUpdate;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub guru_id: String,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub per_option_explanations: Option<Value>,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

fn persist(state: &AppState, question_id: &str, ctx_user: &str, update: ReviewUpdate) -> Result<(), ApiError> {
    state.store.apply_review_update(question_id, &update)?;
    state.store.append_review_log(
        question_id,
        ctx_user,
        update.log_action,
        update.log_notes.as_deref(),
    )?;
    Ok(())
}

pub async fn assign(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Auth(ctx): Auth,
    Json(req): Json<AssignRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = state
        .store
        .get_question(&question_id)?
        .ok_or(CoreError::NotFound("question"))?;
    let update = review::assign(&ctx, &question, &req.guru_id)?;
    persist(&state, &question_id, &ctx.user_id, update)?;
    tracing::info!(%question_id, guru_id = %req.guru_id, "question assigned");
    Ok(Json(json!({"ok": true})))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Auth(ctx): Auth,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = state
        .store
        .get_question(&question_id)?
        .ok_or(CoreError::NotFound("question"))?;
    let update = review::approve(&ctx, &question, req.per_option_explanations)?;
    persist(&state, &question_id, &ctx.user_id, update)?;
    tracing::info!(%question_id, reviewer = %ctx.user_id, "question approved");
    Ok(Json(json!({"ok": true})))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Auth(ctx): Auth,
    Json(req): Json<RejectRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = state
        .store
        .get_question(&question_id)?
        .ok_or(CoreError::NotFound("question"))?;
    let update = review::reject(&ctx, &question, req.notes)?;
    persist(&state, &question_id, &ctx.user_id, update)?;
    tracing::info!(%question_id, reviewer = %ctx.user_id, "question rejected");
    Ok(Json(json!({"ok": true})))
}
