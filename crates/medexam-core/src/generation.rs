//! AI question generation: provider trait, prompt construction, and strict
//! candidate extraction.
//!
//! The provider may wrap its JSON array in prose or markdown fences, so
//! extraction is an explicit, fallible step with its own error kind — a
//! failed parse is surfaced with the raw (truncated) text, never treated as
//! zero results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ProviderError};
use crate::model::{AnswerOption, Exam};

/// Hard cap on questions per generation request.
pub const MAX_QUESTIONS_PER_GENERATION: u32 = 10;
/// Difficulty assigned to candidates that carry none.
pub const DEFAULT_DIFFICULTY: &str = "C1";

/// Fixed generation parameters sent to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 4096,
        }
    }
}

/// Trait for external text-generation backends that produce question
/// candidates. Implemented by `medexam-providers`.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send the prompt and return the raw response text.
    async fn generate(&self, prompt: &str, config: &GenerationConfig)
        -> Result<String, ProviderError>;
}

/// A parsed question candidate from the provider's output. Admin callers
/// get these persisted as drafts; everyone else receives them transiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCandidate {
    pub stem: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub per_option_explanations: Option<serde_json::Value>,
}

/// Clamp a requested count into 1..=10.
pub fn clamp_count(count: Option<u32>) -> u32 {
    count.unwrap_or(1).clamp(1, MAX_QUESTIONS_PER_GENERATION)
}

/// Build the single generation prompt from exam context.
pub fn build_prompt(
    exam: &Exam,
    topic_name: Option<&str>,
    difficulty_level: Option<&str>,
    count: u32,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    match &exam.format_prompt {
        Some(p) if !p.trim().is_empty() => lines.push(p.clone()),
        _ => lines.push(format!("Generate MCQ questions for {}.", exam.name)),
    }
    if let Some(topic) = topic_name {
        lines.push(format!("Topic: {topic}"));
    }
    if let Some(level) = difficulty_level {
        lines.push(format!("Difficulty: {level}"));
    }
    lines.push(format!("Generate exactly {count} questions."));
    lines.push(
        "Return a JSON array of objects, each with: stem, options (array of {key, text}), \
         correct_answer, difficulty_level, per_option_explanations (object with keys A-E)."
            .to_string(),
    );
    lines.push("Return ONLY the JSON array, no markdown or extra text.".to_string());
    lines.join("\n")
}

/// Extract the first well-formed JSON array substring: everything from the
/// first `[` through the last `]`. The provider may wrap the array in prose
/// or markdown fences; anything outside those brackets is discarded.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse and validate candidates out of raw provider output.
///
/// Strict on shape: every candidate must have a non-empty stem, at least
/// two options, and a correct_answer naming one of its option keys. Any
/// violation fails the whole batch as a parse error carrying the raw text.
pub fn parse_candidates(raw: &str) -> CoreResult<Vec<QuestionCandidate>> {
    let array = extract_json_array(raw).ok_or_else(|| CoreError::response_parse(raw))?;
    let candidates: Vec<QuestionCandidate> =
        serde_json::from_str(array).map_err(|_| CoreError::response_parse(raw))?;
    for candidate in &candidates {
        validate_candidate(candidate).map_err(|_| CoreError::response_parse(raw))?;
    }
    Ok(candidates)
}

fn validate_candidate(c: &QuestionCandidate) -> Result<(), String> {
    if c.stem.trim().is_empty() {
        return Err("empty stem".into());
    }
    if c.options.len() < 2 {
        return Err("fewer than two options".into());
    }
    if !c.options.iter().any(|o| o.key == c.correct_answer) {
        return Err(format!(
            "correct_answer '{}' does not name an option",
            c.correct_answer
        ));
    }
    Ok(())
}
