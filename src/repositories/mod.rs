// src/repositories/mod.rs

//! Persistence contracts consumed by the services, and their Postgres adapters.
//!
//! Every method is cancel-safe in the usual async sense: dropping the returned
//! future aborts the store call, and an open transaction is rolled back.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{answer::Answer, assessment::Assessment, attempt::Attempt, stats::QuestionDifficulty},
};

pub mod answer;
pub mod assessment;
pub mod attempt;
pub mod stats;

pub use answer::PgAnswerRepository;
pub use assessment::PgAssessmentRepository;
pub use attempt::PgAttemptRepository;
pub use stats::PgAssessmentStats;

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, AppError>;

    async fn find_by_material_id(&self, material_id: Uuid) -> Result<Option<Assessment>, AppError>;

    /// Insert, or overwrite the mutable columns of an existing row.
    async fn save(&self, assessment: &Assessment) -> Result<(), AppError>;

    /// Fails with `NotFound` when no row was deleted.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attempt>, AppError>;

    /// Newest first.
    async fn find_by_student_and_assessment(
        &self,
        student_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<Vec<Attempt>, AppError>;

    /// Writes the attempt and its answers atomically. There is no update path.
    async fn save(&self, attempt: &Attempt) -> Result<(), AppError>;

    async fn count_by_student_and_assessment(
        &self,
        student_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<i64, AppError>;

    /// Paginated history, newest first.
    async fn find_by_student(
        &self,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Attempt>, AppError>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Ordered by `question_index`.
    async fn find_by_attempt_id(&self, attempt_id: Uuid) -> Result<Vec<Answer>, AppError>;

    /// Transactional batch insert; the target attempts must already exist.
    async fn save(&self, answers: &[Answer]) -> Result<(), AppError>;

    /// Newest first.
    async fn find_by_question_id(
        &self,
        question_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Answer>, AppError>;

    async fn question_difficulty(&self, question_id: &str) -> Result<QuestionDifficulty, AppError>;
}

/// Global aggregates over completed attempts and learning progress.
#[async_trait]
pub trait AssessmentStats: Send + Sync {
    async fn count_completed_assessments(&self) -> Result<i64, AppError>;

    async fn calculate_average_score(&self) -> Result<f64, AppError>;

    async fn question_difficulty(&self, question_id: &str) -> Result<QuestionDifficulty, AppError>;

    async fn count_active_users(&self) -> Result<i64, AppError>;

    async fn calculate_average_progress(&self) -> Result<f64, AppError>;
}

/// Clamps negative paging arguments to zero.
pub(crate) fn normalize_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.max(0), offset.max(0))
}
