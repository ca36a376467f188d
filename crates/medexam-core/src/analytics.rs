//! Read-time analytics over completed attempts.
//!
//! Pure aggregation, recomputed on every request with no cache: per-topic
//! coverage, per-difficulty accuracy, weak areas, and overall totals.
//! Items with no topic or difficulty land in an explicit "Unknown" bucket
//! rather than being dropped, so bucket totals always reconcile with the
//! overall count.

use std::collections::HashMap;

use serde::Serialize;

use crate::attempt::percentage;

/// Accuracy below this (strictly) marks a topic as weak.
pub const WEAK_AREA_ACCURACY_BELOW: i64 = 50;
/// Minimum attempted questions before a topic can be flagged weak; keeps a
/// single unlucky guess from flagging a topic.
pub const WEAK_AREA_MIN_ATTEMPTED: i64 = 3;
/// Bucket label for items with a missing topic or difficulty.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// One answered question joined with its question metadata, the unit the
/// aggregator consumes.
#[derive(Debug, Clone)]
pub struct AnsweredItem {
    pub topic_id: Option<String>,
    pub topic_name: Option<String>,
    pub difficulty_level: Option<String>,
    pub is_correct: bool,
}

/// Per-topic attempted/correct/accuracy row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopicCoverage {
    pub topic_id: String,
    pub topic_name: String,
    pub total: i64,
    pub correct: i64,
    pub accuracy: i64,
}

/// Per-difficulty attempted/correct/accuracy row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DifficultyAccuracy {
    pub difficulty_level: String,
    pub total: i64,
    pub correct: i64,
    pub accuracy: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OverallStats {
    pub total_attempts: i64,
    pub total_questions: i64,
    pub correct: i64,
    pub accuracy: i64,
}

/// The full analytics payload.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub coverage_by_topic: Vec<TopicCoverage>,
    pub accuracy_by_difficulty: Vec<DifficultyAccuracy>,
    pub weak_areas: Vec<TopicCoverage>,
    pub overall: OverallStats,
}

impl AnalyticsReport {
    /// The shape clients get when the user has no completed attempts:
    /// zero-filled, never an error or null.
    pub fn empty() -> Self {
        Self {
            coverage_by_topic: Vec::new(),
            accuracy_by_difficulty: Vec::new(),
            weak_areas: Vec::new(),
            overall: OverallStats {
                total_attempts: 0,
                total_questions: 0,
                correct: 0,
                accuracy: 0,
            },
        }
    }
}

/// Aggregate the items of a user's completed attempts.
pub fn compute_report(completed_attempts: i64, items: &[AnsweredItem]) -> AnalyticsReport {
    if completed_attempts == 0 {
        return AnalyticsReport::empty();
    }

    // Coverage by topic
    let mut topic_stats: HashMap<String, (String, i64, i64)> = HashMap::new();
    for item in items {
        let topic_id = item.topic_id.clone().unwrap_or_else(|| UNKNOWN_BUCKET.into());
        let topic_name = item
            .topic_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_BUCKET.into());
        let entry = topic_stats.entry(topic_id).or_insert((topic_name, 0, 0));
        entry.1 += 1;
        if item.is_correct {
            entry.2 += 1;
        }
    }
    let mut coverage_by_topic: Vec<TopicCoverage> = topic_stats
        .into_iter()
        .map(|(topic_id, (topic_name, total, correct))| TopicCoverage {
            topic_id,
            topic_name,
            total,
            correct,
            accuracy: percentage(correct, total),
        })
        .collect();
    coverage_by_topic.sort_by(|a, b| a.topic_name.cmp(&b.topic_name));

    // Accuracy by difficulty
    let mut diff_stats: HashMap<String, (i64, i64)> = HashMap::new();
    for item in items {
        let level = item
            .difficulty_level
            .clone()
            .unwrap_or_else(|| UNKNOWN_BUCKET.into());
        let entry = diff_stats.entry(level).or_insert((0, 0));
        entry.0 += 1;
        if item.is_correct {
            entry.1 += 1;
        }
    }
    let mut accuracy_by_difficulty: Vec<DifficultyAccuracy> = diff_stats
        .into_iter()
        .map(|(difficulty_level, (total, correct))| DifficultyAccuracy {
            difficulty_level,
            total,
            correct,
            accuracy: percentage(correct, total),
        })
        .collect();
    accuracy_by_difficulty.sort_by(|a, b| a.difficulty_level.cmp(&b.difficulty_level));

    // Weak areas: low accuracy with a meaningful sample, worst first.
    let mut weak_areas: Vec<TopicCoverage> = coverage_by_topic
        .iter()
        .filter(|t| t.accuracy < WEAK_AREA_ACCURACY_BELOW && t.total >= WEAK_AREA_MIN_ATTEMPTED)
        .cloned()
        .collect();
    weak_areas.sort_by(|a, b| {
        a.accuracy
            .cmp(&b.accuracy)
            .then_with(|| a.topic_name.cmp(&b.topic_name))
    });

    let total_questions = items.len() as i64;
    let correct = items.iter().filter(|i| i.is_correct).count() as i64;

    AnalyticsReport {
        coverage_by_topic,
        accuracy_by_difficulty,
        weak_areas,
        overall: OverallStats {
            total_attempts: completed_attempts,
            total_questions,
            correct,
            accuracy: percentage(correct, total_questions),
        },
    }
}
