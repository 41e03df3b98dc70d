// src/repositories/attempt.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, db_err},
    models::{answer::Answer, attempt::Attempt},
    repositories::{
        AttemptRepository,
        answer::{fetch_answers_for_attempts, insert_answers},
        normalize_page,
    },
};

const ATTEMPT_COLUMNS: &str = "id, assessment_id, student_id, score, max_score, time_spent_seconds, \
     started_at, completed_at, created_at, idempotency_key";

#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: Uuid,
    assessment_id: Uuid,
    student_id: Uuid,
    score: i32,
    max_score: i32,
    time_spent_seconds: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    idempotency_key: Option<String>,
}

impl AttemptRow {
    /// Attaches the answers; the aggregate is not validated here.
    fn into_attempt(self, answers: Vec<Answer>) -> Result<Attempt, AppError> {
        // Rows are only ever written complete.
        let completed_at = self.completed_at.ok_or(AppError::InvalidEndTime)?;
        Ok(Attempt {
            id: self.id,
            assessment_id: self.assessment_id,
            student_id: self.student_id,
            score: self.score,
            max_score: self.max_score,
            time_spent_seconds: self.time_spent_seconds,
            started_at: self.started_at,
            completed_at,
            created_at: self.created_at,
            answers,
            idempotency_key: self.idempotency_key,
        })
    }
}

/// Postgres implementation of [`AttemptRepository`].
#[derive(Clone)]
pub struct PgAttemptRepository {
    pool: PgPool,
}

impl PgAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the answers of `rows` with one query and assembles the aggregates,
    /// keeping the row order.
    ///
    /// Rows are returned as stored. An attempt whose answers were appended after
    /// submission no longer matches its score; that is logged, not rejected.
    async fn assemble(&self, rows: Vec<AttemptRow>) -> Result<Vec<Attempt>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut answers = fetch_answers_for_attempts(&self.pool, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let owned = answers.remove(&row.id).unwrap_or_default();
                let attempt = row.into_attempt(owned)?;
                if let Err(e) = attempt.validate() {
                    tracing::warn!(attempt_id = %attempt.id, "Stored attempt is inconsistent: {}", e);
                }
                Ok(attempt)
            })
            .collect()
    }
}

#[async_trait]
impl AttemptRepository for PgAttemptRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attempt>, AppError> {
        if id.is_nil() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM assessment_attempt WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find attempt"))?;

        let Some(row) = row else {
            tracing::debug!(attempt_id = %id, "Attempt not found");
            return Ok(None);
        };

        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn find_by_student_and_assessment(
        &self,
        student_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<Vec<Attempt>, AppError> {
        if student_id.is_nil() || assessment_id.is_nil() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {}
            FROM assessment_attempt
            WHERE student_id = $1 AND assessment_id = $2 AND completed_at IS NOT NULL
            ORDER BY completed_at DESC, id DESC
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(student_id)
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("find attempts by student and assessment"))?;

        self.assemble(rows).await
    }

    async fn save(&self, attempt: &Attempt) -> Result<(), AppError> {
        attempt.validate()?;

        let mut tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO assessment_attempt (
                id, assessment_id, student_id, score, max_score, time_spent_seconds,
                idempotency_key, started_at, completed_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.assessment_id)
        .bind(attempt.student_id)
        .bind(attempt.score)
        .bind(attempt.max_score)
        .bind(attempt.time_spent_seconds)
        .bind(attempt.idempotency_key.as_deref())
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .bind(attempt.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("insert attempt"))?;

        let indexed: Vec<(i32, &Answer)> = attempt
            .answers
            .iter()
            .enumerate()
            .map(|(i, answer)| (i as i32, answer))
            .collect();
        insert_answers(&mut *tx, &indexed).await?;

        // Dropping `tx` on any early return above rolls the whole submission back.
        tx.commit().await.map_err(db_err("commit transaction"))?;

        tracing::info!(
            attempt_id = %attempt.id,
            student_id = %attempt.student_id,
            score = attempt.score,
            "Attempt saved"
        );
        Ok(())
    }

    async fn count_by_student_and_assessment(
        &self,
        student_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<i64, AppError> {
        if student_id.is_nil() || assessment_id.is_nil() {
            return Ok(0);
        }

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM assessment_attempt
            WHERE student_id = $1 AND assessment_id = $2 AND completed_at IS NOT NULL
            "#,
        )
        .bind(student_id)
        .bind(assessment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("count attempts"))?;

        Ok(count)
    }

    async fn find_by_student(
        &self,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Attempt>, AppError> {
        if student_id.is_nil() {
            return Ok(Vec::new());
        }
        let (limit, offset) = normalize_page(limit, offset);

        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {}
            FROM assessment_attempt
            WHERE student_id = $1 AND completed_at IS NOT NULL
            ORDER BY completed_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("find attempts by student"))?;

        self.assemble(rows).await
    }
}
