//! Catalog and listing endpoints: exams, topics, questions, attempts, flags.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use medexam_core::error::CoreError;
use medexam_core::model::QuestionStatus;
use medexam_store::questions::QuestionFilter;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 50;
const DEFAULT_PAGE_SIZE: u32 = 20;

pub async fn list_exams(
    State(state): State<AppState>,
    Auth(_ctx): Auth,
) -> Result<Json<Value>, ApiError> {
    let exams = state.store.list_exams()?;
    Ok(Json(json!({"exams": exams})))
}

#[derive(Deserialize)]
pub struct TopicsQuery {
    #[serde(default)]
    pub exam_id: Option<String>,
}

pub async fn list_topics(
    State(state): State<AppState>,
    Auth(_ctx): Auth,
    Query(query): Query<TopicsQuery>,
) -> Result<Json<Value>, ApiError> {
    let topics = state.store.list_topics(query.exam_id.as_deref())?;
    Ok(Json(json!({"topics": topics})))
}

#[derive(Deserialize)]
pub struct QuestionsQuery {
    #[serde(default)]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

pub async fn list_questions(
    State(state): State<AppState>,
    Auth(_ctx): Auth,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<QuestionStatus>)
        .transpose()
        .map_err(CoreError::Validation)?;
    let filter = QuestionFilter {
        exam_id: query.exam_id.clone(),
        status,
    };
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (questions, total) = state.store.list_questions(&filter, page, page_size)?;
    Ok(Json(json!({
        "questions": questions,
        "total": total,
        "page": page,
        "page_size": page_size,
    })))
}

pub async fn list_attempts(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<Value>, ApiError> {
    let attempts = state.store.list_attempts_for_user(&ctx.user_id)?;
    Ok(Json(json!({"attempts": attempts})))
}

#[derive(Deserialize)]
pub struct FlagRequest {
    pub question_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn flag_question(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(req): Json<FlagRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .store
        .get_question(&req.question_id)?
        .ok_or(CoreError::NotFound("question"))?;
    let flag = state
        .store
        .insert_flag(&req.question_id, &ctx.user_id, req.reason.as_deref())?;
    Ok((StatusCode::CREATED, Json(json!({"flag_id": flag.id}))))
}
