// src/repositories/assessment.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, db_err},
    models::assessment::{Assessment, AssessmentStatus},
    repositories::AssessmentRepository,
};

#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: Uuid,
    material_id: Uuid,
    mongo_document_id: String,
    total_questions: Option<i32>,
    title: Option<String>,
    pass_threshold: Option<i32>,
    max_attempts: Option<i32>,
    time_limit_minutes: Option<i32>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for Assessment {
    type Error = AppError;

    /// The authoring columns are nullable in the schema; a row missing one is
    /// reported with the error of the invariant it breaks.
    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let assessment = Assessment {
            id: row.id,
            material_id: row.material_id,
            external_document_id: row.mongo_document_id,
            title: row.title.ok_or(AppError::EmptyTitle)?,
            total_questions: row.total_questions.ok_or(AppError::InvalidTotalQuestions)?,
            pass_threshold: row.pass_threshold.ok_or(AppError::InvalidPassThreshold)?,
            max_attempts: row.max_attempts,
            time_limit_minutes: row.time_limit_minutes,
            status: AssessmentStatus::from_db(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        assessment.validate()?;
        Ok(assessment)
    }
}

/// Postgres implementation of [`AssessmentRepository`].
#[derive(Clone)]
pub struct PgAssessmentRepository {
    pool: PgPool,
}

impl PgAssessmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentRepository for PgAssessmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, AppError> {
        if id.is_nil() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT id, material_id, mongo_document_id, total_questions, title, pass_threshold,
                   max_attempts, time_limit_minutes, status, created_at, updated_at
            FROM assessment
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find assessment"))?;

        row.map(Assessment::try_from).transpose()
    }

    /// Most recently created assessment of the material.
    async fn find_by_material_id(&self, material_id: Uuid) -> Result<Option<Assessment>, AppError> {
        if material_id.is_nil() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT id, material_id, mongo_document_id, total_questions, title, pass_threshold,
                   max_attempts, time_limit_minutes, status, created_at, updated_at
            FROM assessment
            WHERE material_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(material_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find assessment by material"))?;

        row.map(Assessment::try_from).transpose()
    }

    async fn save(&self, assessment: &Assessment) -> Result<(), AppError> {
        assessment.validate()?;

        sqlx::query(
            r#"
            INSERT INTO assessment (
                id, material_id, mongo_document_id, questions_count, total_questions, title,
                pass_threshold, max_attempts, time_limit_minutes, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id)
            DO UPDATE SET
                questions_count = EXCLUDED.questions_count,
                total_questions = EXCLUDED.total_questions,
                title = EXCLUDED.title,
                pass_threshold = EXCLUDED.pass_threshold,
                max_attempts = EXCLUDED.max_attempts,
                time_limit_minutes = EXCLUDED.time_limit_minutes,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(assessment.id)
        .bind(assessment.material_id)
        .bind(&assessment.external_document_id)
        .bind(assessment.total_questions)
        .bind(&assessment.title)
        .bind(assessment.pass_threshold)
        .bind(assessment.max_attempts)
        .bind(assessment.time_limit_minutes)
        .bind(assessment.status.as_str())
        .bind(assessment.created_at)
        .bind(assessment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("upsert assessment"))?;

        tracing::debug!(assessment_id = %assessment.id, "Assessment saved");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM assessment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete assessment"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("assessment".to_string()));
        }

        tracing::info!(assessment_id = %id, "Assessment deleted");
        Ok(())
    }
}
