// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// DTO for submitting a completed attempt.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    /// Answers in question order.
    #[validate(length(min = 1, max = 100))]
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Client-chosen key that makes the submission safe to retry.
    #[validate(length(min = 1, max = 64))]
    pub idempotency_key: Option<String>,
}

/// One pre-graded answer as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,
    #[validate(length(min = 1))]
    pub selected_answer_id: String,
    pub is_correct: bool,
    #[validate(range(min = 0))]
    pub time_spent_seconds: i32,
}

/// Outcome of a submitted (or re-read) attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub attempt_id: Uuid,
    pub assessment_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub pass_threshold: i32,
    pub passed: bool,
    pub time_spent_seconds: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub can_retake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_best_score: Option<i32>,
}

/// One row of a student's attempt history.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: Uuid,
    pub assessment_id: Uuid,
    pub material_id: Uuid,
    pub title: String,
    pub score: i32,
    pub max_score: i32,
    pub passed: bool,
    pub time_spent_seconds: i32,
    pub completed_at: DateTime<Utc>,
}

/// Paginated attempt history.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptHistory {
    pub attempts: Vec<AttemptSummary>,
    pub total_count: usize,
    pub page: i64,
    pub limit: i64,
}
