// src/repositories/answer.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::{AppError, db_err},
    models::{answer::Answer, stats::QuestionDifficulty},
    repositories::{AnswerRepository, normalize_page},
};

/// Row of `assessment_attempt_answer` as read back from the store.
#[derive(sqlx::FromRow)]
pub(crate) struct AnswerRow {
    id: Uuid,
    attempt_id: Uuid,
    question_id: String,
    student_answer: String,
    is_correct: bool,
    time_spent_seconds: i32,
    created_at: DateTime<Utc>,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            attempt_id: row.attempt_id,
            question_id: row.question_id,
            selected_answer_id: row.student_answer,
            is_correct: row.is_correct,
            time_spent_seconds: row.time_spent_seconds,
            created_at: row.created_at,
        }
    }
}

/// Rows per multi-row insert; 10 binds each keeps a statement far below
/// Postgres' 65535-parameter limit.
const INSERT_CHUNK_ROWS: usize = 1000;

/// Inserts `(question_index, answer)` pairs with multi-row statements.
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn insert_answers(
    conn: &mut PgConnection,
    indexed: &[(i32, &Answer)],
) -> Result<(), AppError> {
    for chunk in indexed.chunks(INSERT_CHUNK_ROWS) {
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO assessment_attempt_answer (
                id, attempt_id, question_index, question_id, student_answer,
                is_correct, time_spent_seconds, answered_at, created_at, updated_at
            ) ",
        );

        query_builder.push_values(chunk.iter(), |mut row, (index, answer)| {
            row.push_bind(answer.id)
                .push_bind(answer.attempt_id)
                .push_bind(*index)
                .push_bind(answer.question_id.clone())
                .push_bind(answer.selected_answer_id.clone())
                .push_bind(answer.is_correct)
                .push_bind(answer.time_spent_seconds)
                .push_bind(answer.created_at)
                .push_bind(answer.created_at)
                .push_bind(answer.created_at);
        });

        query_builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(db_err("insert answers"))?;
    }

    Ok(())
}

/// Loads the answers of several attempts in one query, grouped by attempt id
/// and ordered by `question_index` (then `answered_at`, then row id).
pub(crate) async fn fetch_answers_for_attempts(
    pool: &PgPool,
    attempt_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Answer>>, AppError> {
    let mut grouped: HashMap<Uuid, Vec<Answer>> = HashMap::new();
    if attempt_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = sqlx::query_as::<_, AnswerRow>(
        r#"
        SELECT id, attempt_id, question_id, student_answer, is_correct,
               time_spent_seconds, created_at
        FROM assessment_attempt_answer
        WHERE attempt_id = ANY($1)
        ORDER BY attempt_id, question_index ASC, answered_at ASC, id ASC
        "#,
    )
    .bind(attempt_ids.to_vec())
    .fetch_all(pool)
    .await
    .map_err(db_err("find answers by attempt"))?;

    for row in rows {
        grouped.entry(row.attempt_id).or_default().push(row.into());
    }
    Ok(grouped)
}

pub(crate) async fn query_question_difficulty(
    pool: &PgPool,
    question_id: &str,
) -> Result<QuestionDifficulty, AppError> {
    if question_id.is_empty() {
        return Err(AppError::InvalidQuestionId);
    }

    let (total, correct) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE is_correct) AS correct
        FROM assessment_attempt_answer
        WHERE question_id = $1
        "#,
    )
    .bind(question_id)
    .fetch_one(pool)
    .await
    .map_err(db_err("calculate question difficulty"))?;

    Ok(QuestionDifficulty::from_counts(total, correct))
}

/// Postgres implementation of [`AnswerRepository`].
#[derive(Clone)]
pub struct PgAnswerRepository {
    pool: PgPool,
}

impl PgAnswerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerRepository for PgAnswerRepository {
    async fn find_by_attempt_id(&self, attempt_id: Uuid) -> Result<Vec<Answer>, AppError> {
        if attempt_id.is_nil() {
            return Ok(Vec::new());
        }

        let mut grouped = fetch_answers_for_attempts(&self.pool, &[attempt_id]).await?;
        Ok(grouped.remove(&attempt_id).unwrap_or_default())
    }

    /// Appends the batch after any answers already stored for the same attempt,
    /// keeping `question_index` in supplied order.
    async fn save(&self, answers: &[Answer]) -> Result<(), AppError> {
        if answers.is_empty() {
            return Err(AppError::NoAnswersProvided);
        }
        for answer in answers {
            answer.validate()?;
        }

        let mut tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;

        // Serializes concurrent batches on the same attempt until commit, so each
        // one reads the index left by the previous. Sorted to keep lock order stable.
        let mut attempt_ids: Vec<Uuid> = answers.iter().map(|a| a.attempt_id).collect();
        attempt_ids.sort();
        attempt_ids.dedup();
        sqlx::query("SELECT id FROM assessment_attempt WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&attempt_ids)
            .execute(&mut *tx)
            .await
            .map_err(db_err("lock attempts"))?;

        let mut next_index: HashMap<Uuid, i32> = HashMap::new();
        let mut indexed = Vec::with_capacity(answers.len());
        for answer in answers {
            let index = match next_index.get(&answer.attempt_id) {
                Some(index) => *index,
                None => sqlx::query_scalar::<_, i32>(
                    "SELECT COALESCE(MAX(question_index) + 1, 0) FROM assessment_attempt_answer WHERE attempt_id = $1",
                )
                .bind(answer.attempt_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err("read next question index"))?,
            };
            next_index.insert(answer.attempt_id, index + 1);
            indexed.push((index, answer));
        }

        insert_answers(&mut *tx, &indexed).await?;

        tx.commit().await.map_err(db_err("commit transaction"))?;

        tracing::debug!("Saved {} answers", answers.len());
        Ok(())
    }

    async fn find_by_question_id(
        &self,
        question_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Answer>, AppError> {
        if question_id.is_empty() {
            return Err(AppError::InvalidQuestionId);
        }
        let (limit, offset) = normalize_page(limit, offset);

        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, attempt_id, question_id, student_answer, is_correct,
                   time_spent_seconds, created_at
            FROM assessment_attempt_answer
            WHERE question_id = $1
            ORDER BY answered_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(question_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("find answers by question"))?;

        Ok(rows.into_iter().map(Answer::from).collect())
    }

    async fn question_difficulty(&self, question_id: &str) -> Result<QuestionDifficulty, AppError> {
        query_question_difficulty(&self.pool, question_id).await
    }
}
