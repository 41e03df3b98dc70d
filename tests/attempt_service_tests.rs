// tests/attempt_service_tests.rs

mod common;

use assessment_core::config::Config;
use assessment_core::error::AppError;
use assessment_core::models::submission::{AnswerInput, SubmitAttemptRequest};
use assessment_core::repositories::AssessmentRepository;
use assessment_core::state::AppState;
use chrono::{Duration, Utc};
use uuid::Uuid;

fn test_config() -> Config {
    Config {
        database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
        rust_log: "error".to_string(),
        max_connections: 2,
        acquire_timeout_secs: 3,
        connect_retries: 0,
        log_dir: "logs".to_string(),
    }
}

fn request(correct: &[bool], key: Option<String>) -> SubmitAttemptRequest {
    let started_at = Utc::now() - Duration::minutes(30);
    SubmitAttemptRequest {
        answers: correct
            .iter()
            .enumerate()
            .map(|(i, ok)| AnswerInput {
                question_id: format!("q{}", i + 1),
                selected_answer_id: "opt-a".to_string(),
                is_correct: *ok,
                time_spent_seconds: 15,
            })
            .collect(),
        started_at,
        completed_at: started_at + Duration::seconds(120),
        idempotency_key: key,
    }
}

#[tokio::test]
async fn test_submit_result_and_history_flow() {
    let Some(pool) = common::setup().await else { return };
    let state = AppState::new(pool.clone(), test_config());
    let service = state.attempt_service();

    let mut assessment = common::seed_assessment(&pool).await;
    assessment.set_max_attempts(2).unwrap();
    state.assessment_repository().save(&assessment).await.unwrap();

    let student = Uuid::new_v4();
    let key = format!("submit-{}", Uuid::new_v4());

    let first = service
        .submit_attempt(student, assessment.id, request(&[true, false, true, false, true], Some(key.clone())))
        .await
        .unwrap();
    assert_eq!(first.score, 60);
    assert!(first.passed);
    assert!(first.can_retake);
    assert_eq!(first.previous_best_score, None);

    // A retried request is rejected and does not consume an attempt.
    let err = service
        .submit_attempt(student, assessment.id, request(&[true], Some(key)))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::DuplicateIdempotencyKey);

    let second = service
        .submit_attempt(student, assessment.id, request(&[false, false], None))
        .await
        .unwrap();
    assert_eq!(second.score, 0);
    assert!(!second.passed);
    assert!(!second.can_retake);
    assert_eq!(second.previous_best_score, Some(60));

    let err = service
        .submit_attempt(student, assessment.id, request(&[true], None))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::MaxAttemptsReached);

    let result = service.attempt_result(first.attempt_id, student).await.unwrap();
    assert_eq!(result.correct_answers, 3);
    assert_eq!(result.total_questions, 5);
    assert!(!result.can_retake);

    let history = service.attempt_history(student, 10, 0).await.unwrap();
    assert_eq!(history.total_count, 2);
    assert_eq!(history.page, 1);
    assert!(history.attempts.iter().all(|s| s.title == "Integration quiz"));
}
