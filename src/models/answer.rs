// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::now};

/// One response within an attempt.
/// Represents a row of the 'assessment_attempt_answer' table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,

    /// Back-reference to the owning attempt.
    pub attempt_id: Uuid,

    /// Opaque id of the question in the external document store.
    pub question_id: String,

    /// Opaque id of the option the student picked.
    pub selected_answer_id: String,

    /// Graded by the caller; never re-graded here.
    pub is_correct: bool,

    pub time_spent_seconds: i32,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(
        attempt_id: Uuid,
        question_id: impl Into<String>,
        selected_answer_id: impl Into<String>,
        is_correct: bool,
        time_spent_seconds: i32,
    ) -> Result<Self, AppError> {
        let question_id = question_id.into();
        let selected_answer_id = selected_answer_id.into();

        if attempt_id.is_nil() {
            return Err(AppError::InvalidAttemptId);
        }
        if question_id.is_empty() {
            return Err(AppError::InvalidQuestionId);
        }
        if selected_answer_id.is_empty() {
            return Err(AppError::InvalidSelectedAnswerId);
        }
        if time_spent_seconds < 0 {
            return Err(AppError::InvalidTimeSpent);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            attempt_id,
            question_id,
            selected_answer_id,
            is_correct,
            time_spent_seconds,
            created_at: now(),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.is_nil() {
            return Err(AppError::InvalidAnswerId);
        }
        if self.attempt_id.is_nil() {
            return Err(AppError::InvalidAttemptId);
        }
        if self.question_id.is_empty() {
            return Err(AppError::InvalidQuestionId);
        }
        if self.selected_answer_id.is_empty() {
            return Err(AppError::InvalidSelectedAnswerId);
        }
        if self.time_spent_seconds < 0 {
            return Err(AppError::InvalidTimeSpent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_answer() {
        let attempt_id = Uuid::new_v4();
        let a = Answer::new(attempt_id, "q1", "opt-a", true, 12).unwrap();
        assert_eq!(a.attempt_id, attempt_id);
        assert!(!a.id.is_nil());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_instant_answer_allowed() {
        assert!(Answer::new(Uuid::new_v4(), "q1", "a", false, 0).is_ok());
    }

    #[test]
    fn test_rejects_bad_fields() {
        assert_eq!(
            Answer::new(Uuid::nil(), "q1", "a", true, 1).unwrap_err(),
            AppError::InvalidAttemptId
        );
        assert_eq!(
            Answer::new(Uuid::new_v4(), "", "a", true, 1).unwrap_err(),
            AppError::InvalidQuestionId
        );
        assert_eq!(
            Answer::new(Uuid::new_v4(), "q1", "", true, 1).unwrap_err(),
            AppError::InvalidSelectedAnswerId
        );
        assert_eq!(
            Answer::new(Uuid::new_v4(), "q1", "a", true, -1).unwrap_err(),
            AppError::InvalidTimeSpent
        );
    }

    #[test]
    fn test_validate_nil_id() {
        let mut a = Answer::new(Uuid::new_v4(), "q1", "a", true, 1).unwrap();
        a.id = Uuid::nil();
        assert_eq!(a.validate(), Err(AppError::InvalidAnswerId));
    }
}
