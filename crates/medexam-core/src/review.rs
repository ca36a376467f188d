//! Question review workflow state machine.
//!
//! States: `draft → assigned → reviewed` (terminal, eligible for
//! publication) or `assigned → rejected` (terminal, hidden). A question
//! still pending review may be re-assigned to a different reviewer; once
//! terminal, any further review action is a conflict, never a silent
//! success.
//!
//! These functions are pure: they authorize, validate the transition, and
//! describe the resulting write. Persistence (the question update plus the
//! append-only log entry) happens in the caller.

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::model::{AuthContext, Question, QuestionStatus, ReviewAction};

/// The write a successful review action produces: the question's new state
/// and the audit log entry to append.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub status: QuestionStatus,
    pub reviewed_by: Option<String>,
    /// Explanation overwrite, only on approve.
    pub per_option_explanations: Option<Value>,
    pub log_action: ReviewAction,
    pub log_notes: Option<String>,
}

/// Compute the next status for a review action, or a conflict.
pub fn transition(current: QuestionStatus, action: ReviewAction) -> CoreResult<QuestionStatus> {
    match (current, action) {
        (QuestionStatus::Draft, ReviewAction::Assigned)
        | (QuestionStatus::Assigned, ReviewAction::Assigned) => Ok(QuestionStatus::Assigned),
        (QuestionStatus::Assigned, ReviewAction::Approved) => Ok(QuestionStatus::Reviewed),
        (QuestionStatus::Assigned, ReviewAction::Rejected) => Ok(QuestionStatus::Rejected),
        (state, action) => Err(CoreError::Conflict(format!(
            "cannot {action} a {state} question"
        ))),
    }
}

/// Assign a question to a reviewer. Admin only.
pub fn assign(ctx: &AuthContext, question: &Question, guru_id: &str) -> CoreResult<ReviewUpdate> {
    if !ctx.is_admin() {
        return Err(CoreError::Forbidden("admin access required".into()));
    }
    if guru_id.trim().is_empty() {
        return Err(CoreError::Validation("guru_id is required".into()));
    }
    let status = transition(question.status, ReviewAction::Assigned)?;
    Ok(ReviewUpdate {
        status,
        reviewed_by: Some(guru_id.to_string()),
        per_option_explanations: None,
        log_action: ReviewAction::Assigned,
        log_notes: Some(format!("Assigned to guru {guru_id}")),
    })
}

/// Approve a question, optionally overwriting its per-option explanations.
/// Caller must be the assigned reviewer or an admin.
pub fn approve(
    ctx: &AuthContext,
    question: &Question,
    per_option_explanations: Option<Value>,
) -> CoreResult<ReviewUpdate> {
    authorize_verdict(ctx, question)?;
    let status = transition(question.status, ReviewAction::Approved)?;
    Ok(ReviewUpdate {
        status,
        reviewed_by: question.reviewed_by.clone(),
        per_option_explanations,
        log_action: ReviewAction::Approved,
        log_notes: None,
    })
}

/// Reject a question with an optional note. Terminal; no re-submission path
/// exists in this core. Same authorization rule as approve.
pub fn reject(
    ctx: &AuthContext,
    question: &Question,
    notes: Option<String>,
) -> CoreResult<ReviewUpdate> {
    authorize_verdict(ctx, question)?;
    let status = transition(question.status, ReviewAction::Rejected)?;
    Ok(ReviewUpdate {
        status,
        reviewed_by: question.reviewed_by.clone(),
        per_option_explanations: None,
        log_action: ReviewAction::Rejected,
        log_notes: notes,
    })
}

fn authorize_verdict(ctx: &AuthContext, question: &Question) -> CoreResult<()> {
    let is_assignee = question
        .reviewed_by
        .as_deref()
        .is_some_and(|r| r == ctx.user_id);
    if is_assignee || ctx.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("not assigned to you".into()))
    }
}
