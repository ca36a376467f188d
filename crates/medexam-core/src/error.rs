//! Error taxonomy for the exam assessment core.
//!
//! `ProviderError` is defined here rather than in `medexam-providers` so the
//! generation service can classify provider failures without string matching.

use thiserror::Error;

/// How much raw provider output to carry in a parse-failure error.
pub const RAW_RESPONSE_LIMIT: usize = 500;

/// Errors surfaced by core operations.
///
/// Each variant maps to exactly one HTTP status in the API layer; handlers
/// return these directly instead of inventing per-route error shapes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No caller identity was supplied.
    #[error("authentication required")]
    Unauthorized,

    /// The caller is authenticated but lacks the required role.
    #[error("{0}")]
    Forbidden(String),

    /// The resource is absent, or owned by someone else. Ownership
    /// mismatches deliberately collapse into this variant so a 404 never
    /// confirms the existence of another user's data.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The requested transition is not valid from the current state.
    #[error("{0}")]
    Conflict(String),

    /// The external generation provider was unreachable or returned an
    /// error response.
    #[error("AI generation failed")]
    UpstreamAi { detail: String },

    /// The provider responded, but no well-formed candidate array could be
    /// extracted from its output. Carries the (truncated) raw text for
    /// diagnosis; never silently treated as zero results.
    #[error("failed to parse AI response")]
    ResponseParse { raw: String },

    /// Anything unanticipated (storage faults, poisoned pools, ...).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Build a parse failure, truncating the raw text to a loggable size.
    pub fn response_parse(raw: &str) -> Self {
        CoreError::ResponseParse {
            raw: truncate(raw, RAW_RESPONSE_LIMIT),
        }
    }

    /// Build an upstream failure with truncated detail.
    pub fn upstream(detail: &str) -> Self {
        CoreError::UpstreamAi {
            detail: truncate(detail, 200),
        }
    }
}

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from the external text-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned an error response.
    #[error("provider error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("provider request timed out after {0}s")]
    Timeout(u64),

    /// A transport-level failure occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected envelope.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        CoreError::upstream(&err.to_string())
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    // Respect char boundaries; provider output is arbitrary UTF-8.
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
