//! Access gate: per-request identity and role resolution.
//!
//! The upstream auth gateway terminates sessions and injects the verified
//! caller id as the `x-user-id` header. This extractor turns that header
//! into an `AuthContext`, reading the role set fresh from storage on every
//! request so a revoked role takes effect immediately.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use medexam_core::error::CoreError;
use medexam_core::model::AuthContext;

use crate::error::ApiError;
use crate::state::AppState;

const USER_ID_HEADER: &str = "x-user-id";

/// Extractor wrapper; handlers take `Auth(ctx): Auth`.
pub struct Auth(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(CoreError::Unauthorized)?;

        let roles = state.store.roles_for(user_id)?;
        Ok(Auth(AuthContext::new(user_id, roles)))
    }
}
