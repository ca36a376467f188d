//! Core data model for the exam assessment backend.
//!
//! Rows come out of the store in these shapes; the enums serialize to the
//! same lowercase strings the storage layer writes, so one set of
//! `Display`/`FromStr` impls covers both JSON and column encoding.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one role with elevated capability in this core.
pub const ADMIN_ROLE: &str = "admin";

/// Lifecycle stage of a question.
///
/// `published` is the only state visible to attempt creation; `reviewed` and
/// `rejected` are terminal for the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Draft,
    Assigned,
    Reviewed,
    Rejected,
    Published,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionStatus::Draft => write!(f, "draft"),
            QuestionStatus::Assigned => write!(f, "assigned"),
            QuestionStatus::Reviewed => write!(f, "reviewed"),
            QuestionStatus::Rejected => write!(f, "rejected"),
            QuestionStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for QuestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(QuestionStatus::Draft),
            "assigned" => Ok(QuestionStatus::Assigned),
            "reviewed" => Ok(QuestionStatus::Reviewed),
            "rejected" => Ok(QuestionStatus::Rejected),
            "published" => Ok(QuestionStatus::Published),
            other => Err(format!("unknown question status: {other}")),
        }
    }
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Manual,
    Ai,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Manual => write!(f, "manual"),
            SourceType::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SourceType::Manual),
            "ai" => Ok(SourceType::Ai),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

/// Attempt mode: `study` shows answers immediately, `exam` hides them until
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptMode {
    Study,
    Exam,
}

impl fmt::Display for AttemptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptMode::Study => write!(f, "study"),
            AttemptMode::Exam => write!(f, "exam"),
        }
    }
}

impl FromStr for AttemptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(AttemptMode::Study),
            "exam" => Ok(AttemptMode::Exam),
            other => Err(format!("mode must be 'study' or 'exam', got '{other}'")),
        }
    }
}

/// Action recorded in the review audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Assigned,
    Approved,
    Rejected,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::Assigned => write!(f, "assigned"),
            ReviewAction::Approved => write!(f, "approved"),
            ReviewAction::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(ReviewAction::Assigned),
            "approved" => Ok(ReviewAction::Approved),
            "rejected" => Ok(ReviewAction::Rejected),
            other => Err(format!("unknown review action: {other}")),
        }
    }
}

/// One answer choice within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Option key the learner submits (e.g. "A").
    pub key: String,
    /// Display text.
    pub text: String,
}

/// A question row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub exam_id: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    pub stem: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    /// Per-option explanations keyed by option key.
    #[serde(default)]
    pub per_option_explanations: Option<serde_json::Value>,
    pub status: QuestionStatus,
    /// Set if and only if status is assigned, reviewed, or rejected.
    #[serde(default)]
    pub reviewed_by: Option<String>,
    pub source_type: SourceType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only review audit entry. Never mutated, never consulted for
/// authorization decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub id: String,
    pub question_id: String,
    pub reviewer_id: String,
    pub action: ReviewAction,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One exam/study session owned by a user.
///
/// `correct_count` and `time_spent_seconds` are denormalized caches — always
/// recomputed from the item set, never incremented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub mode: AttemptMode,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub total_questions: i64,
    pub correct_count: i64,
    pub time_spent_seconds: i64,
}

/// One answered question within an attempt. `is_correct` is fixed at submit
/// time so historical correctness survives later question edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptItem {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: i64,
    pub created_at: DateTime<Utc>,
}

/// A user-reported problem with a question. Write-only in this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Exam catalog entry; `format_prompt` seeds AI generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub curriculum: Option<String>,
    #[serde(default)]
    pub format_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Topic catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub exam_id: String,
    pub name: String,
}

/// Resolved caller identity for one request.
///
/// Built once at request entry by the access gate and passed to handlers;
/// roles are re-read per request, never cached across calls.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub roles: HashSet<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, roles: HashSet<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }
}
