//! Read-time analytics endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use medexam_core::analytics::{compute_report, AnalyticsReport};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub exam_id: Option<String>,
}

pub async fn analytics(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let attempt_ids = state
        .store
        .completed_attempt_ids(&ctx.user_id, query.exam_id.as_deref())?;
    let items = state.store.answered_items(&attempt_ids)?;
    Ok(Json(compute_report(attempt_ids.len() as i64, &items)))
}
