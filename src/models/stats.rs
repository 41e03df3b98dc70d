// src/models/stats.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Empirical difficulty of one question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuestionDifficulty {
    pub total_answers: i64,
    pub correct_answers: i64,
    /// `(total - correct) / total`, or 0.0 when nothing was recorded.
    pub error_rate: f64,
}

impl QuestionDifficulty {
    pub fn from_counts(total_answers: i64, correct_answers: i64) -> Self {
        let error_rate = if total_answers > 0 {
            (total_answers - correct_answers) as f64 / total_answers as f64
        } else {
            0.0
        };
        Self {
            total_answers,
            correct_answers,
            error_rate,
        }
    }
}

/// Snapshot of the global assessment statistics.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_completed_assessments: i64,
    pub average_assessment_score: f64,
    pub active_users_last_30_days: i64,
    pub average_progress: f64,
    pub generated_at: DateTime<Utc>,
}
