// src/error.rs

use thiserror::Error;

use crate::utils::db::{ATTEMPT_PRIMARY_KEY, IDEMPOTENCY_KEY_INDEX};

/// Global error taxonomy.
/// Every constructor, validator, repository and service returns one of these kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    // Validation: identifiers
    #[error("domain: invalid attempt ID")]
    InvalidAttemptId,
    #[error("domain: invalid assessment ID")]
    InvalidAssessmentId,
    #[error("domain: invalid material ID")]
    InvalidMaterialId,
    #[error("domain: invalid student ID")]
    InvalidStudentId,
    #[error("domain: invalid question ID")]
    InvalidQuestionId,
    #[error("domain: invalid selected answer ID")]
    InvalidSelectedAnswerId,
    #[error("domain: invalid answer ID")]
    InvalidAnswerId,
    #[error("domain: external document ID must be exactly 24 characters")]
    InvalidExternalDocumentId,

    // Validation: assessment fields
    #[error("domain: assessment title cannot be empty")]
    EmptyTitle,
    #[error("domain: total questions must be between 1 and 100")]
    InvalidTotalQuestions,
    #[error("domain: pass threshold must be between 0 and 100")]
    InvalidPassThreshold,
    #[error("domain: max attempts must be at least 1")]
    InvalidMaxAttempts,
    #[error("domain: time limit must be between 1 and 180 minutes")]
    InvalidTimeLimit,
    #[error("domain: updated_at cannot precede created_at")]
    InvalidUpdatedAt,

    // Validation: attempt fields
    #[error("domain: score must be between 0 and 100")]
    InvalidScore,
    #[error("domain: time spent must be positive and <= 7200 seconds")]
    InvalidTimeSpent,
    #[error("domain: invalid start time")]
    InvalidStartTime,
    #[error("domain: end time must be after start time")]
    InvalidEndTime,
    #[error("domain: at least one answer must be provided")]
    NoAnswersProvided,
    #[error("domain: an attempt holds at most 100 answers")]
    TooManyAnswers,
    #[error("domain: attempt already completed, cannot modify")]
    AttemptAlreadyCompleted,
    #[error("domain: idempotency key must be 1-64 characters")]
    InvalidIdempotencyKey,

    /// Request payload rejected before reaching the domain.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed process configuration.
    #[error("config: {0}")]
    Config(String),

    // Consistency
    #[error("domain: score mismatch with answers (stored {stored}, expected {expected})")]
    ScoreMismatch { stored: i32, expected: i32 },

    // Persistence
    #[error("{0} not found")]
    NotFound(String),
    #[error("duplicate submission: idempotency key already used")]
    DuplicateIdempotencyKey,
    #[error("referenced {0} does not exist")]
    MissingReference(String),
    #[error("{0}")]
    Database(String),

    // Service rules
    #[error("max attempts reached")]
    MaxAttemptsReached,
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Coarse classification used by callers to pick a transport-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Consistency,
    NotFound,
    Conflict,
    Forbidden,
    Infrastructure,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ScoreMismatch { .. } => ErrorCategory::Consistency,
            AppError::NotFound(_) => ErrorCategory::NotFound,
            AppError::DuplicateIdempotencyKey
            | AppError::AttemptAlreadyCompleted
            | AppError::MaxAttemptsReached => ErrorCategory::Conflict,
            AppError::Forbidden(_) => ErrorCategory::Forbidden,
            AppError::Database(_) | AppError::Config(_) => ErrorCategory::Infrastructure,
            _ => ErrorCategory::Validation,
        }
    }

    /// Translates a driver error, prefixing generic failures with the operation that hit them.
    pub fn from_db(operation: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(IDEMPOTENCY_KEY_INDEX) => return AppError::DuplicateIdempotencyKey,
                    Some(ATTEMPT_PRIMARY_KEY) => return AppError::AttemptAlreadyCompleted,
                    _ => {}
                }
            }
            if db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("row").to_string();
                return AppError::MissingReference(constraint);
            }
        }
        AppError::Database(format!("postgres: {}: {}", operation, err))
    }
}

/// Builds a `map_err` adapter that logs the failure and translates it.
pub fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let err = AppError::from_db(operation, e);
        match &err {
            AppError::Database(msg) => tracing::error!("Failed to {}: {}", operation, msg),
            other => tracing::warn!("Rejected {}: {}", operation, other),
        }
        err
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from_db("query", err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(format!("postgres: migrate: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(AppError::EmptyTitle.category(), ErrorCategory::Validation);
        assert_eq!(
            AppError::ScoreMismatch { stored: 50, expected: 60 }.category(),
            ErrorCategory::Consistency
        );
        assert_eq!(
            AppError::DuplicateIdempotencyKey.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            AppError::NotFound("assessment".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            AppError::Database("postgres: x".into()).category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            AppError::Config("DATABASE_URL must be set".into()).category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(AppError::InvalidUpdatedAt.category(), ErrorCategory::Validation);
        assert_eq!(AppError::TooManyAnswers.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_generic_db_errors_carry_operation_prefix() {
        let err = AppError::from_db("insert attempt", sqlx::Error::RowNotFound);
        match err {
            AppError::Database(msg) => assert!(msg.starts_with("postgres: insert attempt: ")),
            other => panic!("unexpected error: {:?}", other),
        }

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn test_messages_match_taxonomy() {
        assert_eq!(
            AppError::InvalidExternalDocumentId.to_string(),
            "domain: external document ID must be exactly 24 characters"
        );
        assert_eq!(AppError::NotFound("assessment".into()).to_string(), "assessment not found");
    }
}
