//! AI question generation endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use medexam_core::error::CoreError;
use medexam_core::generation::{
    build_prompt, clamp_count, parse_candidates, GenerationConfig, QuestionCandidate,
    DEFAULT_DIFFICULTY,
};
use medexam_core::model::{QuestionStatus, SourceType};
use medexam_store::questions::NewQuestion;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub exam_id: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

pub async fn generate_question(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let exam = state
        .store
        .get_exam(&req.exam_id)?
        .ok_or(CoreError::NotFound("exam"))?;

    let topic_name = match &req.topic_id {
        Some(id) => state.store.topic_name(id)?,
        None => None,
    };

    let count = clamp_count(req.count);
    let prompt = build_prompt(
        &exam,
        topic_name.as_deref(),
        req.difficulty_level.as_deref(),
        count,
    );

    let raw = state
        .generator
        .generate(&prompt, &GenerationConfig::default())
        .await
        .map_err(CoreError::from)?;
    let candidates = parse_candidates(&raw)?;

    tracing::info!(
        exam_id = %req.exam_id,
        provider = state.generator.name(),
        candidates = candidates.len(),
        "questions generated"
    );

    // Admins get drafts persisted for the review pipeline; everyone else
    // receives the candidates transiently.
    if ctx.is_admin() {
        let mut inserted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let QuestionCandidate {
                stem,
                options,
                correct_answer,
                difficulty_level,
                per_option_explanations,
            } = candidate;
            let question = state.store.insert_question(NewQuestion {
                exam_id: exam.id.clone(),
                topic_id: req.topic_id.clone(),
                stem,
                options,
                correct_answer,
                difficulty_level: difficulty_level
                    .or_else(|| req.difficulty_level.clone())
                    .or_else(|| Some(DEFAULT_DIFFICULTY.to_string())),
                per_option_explanations,
                status: QuestionStatus::Draft,
                source_type: SourceType::Ai,
                created_by: ctx.user_id.clone(),
            })?;
            inserted.push(question);
        }
        Ok(Json(json!({"questions": inserted})))
    } else {
        Ok(Json(json!({"questions": candidates})))
    }
}
