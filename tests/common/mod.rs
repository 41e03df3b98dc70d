// tests/common/mod.rs

#![allow(dead_code)]

use assessment_core::models::{answer::Answer, assessment::Assessment, attempt::Attempt};
use assessment_core::repositories::{AssessmentRepository, PgAssessmentRepository};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

pub const DOC_ID: &str = "507f1f77bcf86cd799439011";

/// Connects to `DATABASE_URL` and applies the migrations.
/// Returns `None` when no database is configured so the caller can skip.
pub async fn setup() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

/// Like [`setup`], but migrates into a fresh schema so aggregate queries only
/// see rows the calling test inserts. Returns the pool and the schema name.
pub async fn setup_isolated() -> Option<(PgPool, String)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let schema = format!("test_{}", Uuid::new_v4().simple());
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");
    admin.close().await;

    let options = database_url
        .parse::<PgConnectOptions>()
        .expect("Invalid DATABASE_URL")
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("Failed to connect to test schema");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate test schema");

    Some((pool, schema))
}

pub async fn drop_schema(pool: &PgPool, schema: &str) {
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
        .execute(pool)
        .await
        .expect("Failed to drop test schema");
}

pub async fn insert_progress(pool: &PgPool, percentage: i32, days_ago: i32) {
    sqlx::query(
        r#"
        INSERT INTO material_progress (material_id, user_id, percentage, last_accessed_at)
        VALUES ($1, $2, $3, NOW() - make_interval(days => $4))
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(Uuid::new_v4())
    .bind(percentage)
    .bind(days_ago)
    .execute(pool)
    .await
    .expect("Failed to insert progress row");
}

/// Stores a fresh assessment so attempts have a row to reference.
pub async fn seed_assessment(pool: &PgPool) -> Assessment {
    let assessment = Assessment::new(Uuid::new_v4(), DOC_ID, "Integration quiz", 5, 60).unwrap();
    PgAssessmentRepository::new(pool.clone())
        .save(&assessment)
        .await
        .expect("Failed to seed assessment");
    assessment
}

pub fn answers(correct: &[bool]) -> Vec<Answer> {
    let provisional = Uuid::new_v4();
    correct
        .iter()
        .enumerate()
        .map(|(i, ok)| Answer::new(provisional, format!("q{}", i + 1), "opt-a", *ok, 20).unwrap())
        .collect()
}

pub fn attempt_at(
    assessment_id: Uuid,
    student_id: Uuid,
    correct: &[bool],
    started_at: DateTime<Utc>,
    seconds: i64,
) -> Attempt {
    Attempt::new(
        assessment_id,
        student_id,
        answers(correct),
        started_at,
        started_at + Duration::seconds(seconds),
    )
    .unwrap()
}

pub fn attempt(assessment_id: Uuid, student_id: Uuid, correct: &[bool]) -> Attempt {
    attempt_at(
        assessment_id,
        student_id,
        correct,
        Utc::now() - Duration::hours(1),
        300,
    )
}
