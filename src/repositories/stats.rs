// src/repositories/stats.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    config::ACTIVE_USER_WINDOW_DAYS,
    error::{AppError, db_err},
    models::stats::QuestionDifficulty,
    repositories::{AssessmentStats, answer::query_question_difficulty},
};

/// Postgres implementation of [`AssessmentStats`].
#[derive(Clone)]
pub struct PgAssessmentStats {
    pool: PgPool,
}

impl PgAssessmentStats {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentStats for PgAssessmentStats {
    async fn count_completed_assessments(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assessment_attempt WHERE completed_at IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count completed assessments"))
    }

    async fn calculate_average_score(&self) -> Result<f64, AppError> {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(AVG(score)::FLOAT8, 0::FLOAT8)
            FROM assessment_attempt
            WHERE completed_at IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("calculate average score"))
    }

    async fn question_difficulty(&self, question_id: &str) -> Result<QuestionDifficulty, AppError> {
        query_question_difficulty(&self.pool, question_id).await
    }

    async fn count_active_users(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT user_id)
            FROM material_progress
            WHERE last_accessed_at >= NOW() - make_interval(days => $1)
            "#,
        )
        .bind(ACTIVE_USER_WINDOW_DAYS)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count active users"))
    }

    async fn calculate_average_progress(&self) -> Result<f64, AppError> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(AVG(percentage)::FLOAT8, 0::FLOAT8) FROM material_progress",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("calculate average progress"))
    }
}
