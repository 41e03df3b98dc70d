// src/services/attempt_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        answer::Answer,
        assessment::Assessment,
        attempt::Attempt,
        submission::{AttemptHistory, AttemptResult, AttemptSummary, SubmitAttemptRequest},
    },
    repositories::{AssessmentRepository, AttemptRepository},
};

/// Orchestrates submission and retrieval of attempts on top of the repositories.
#[derive(Clone)]
pub struct AttemptService {
    assessments: Arc<dyn AssessmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    pub fn new(
        assessments: Arc<dyn AssessmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            assessments,
            attempts,
        }
    }

    /// Validates, scores and persists a completed attempt.
    ///
    /// * Refuses with `MaxAttemptsReached` once the student used up the assessment's attempts.
    /// * A retried request carrying an already-used idempotency key fails with
    ///   `DuplicateIdempotencyKey` and stores nothing.
    pub async fn submit_attempt(
        &self,
        student_id: Uuid,
        assessment_id: Uuid,
        req: SubmitAttemptRequest,
    ) -> Result<AttemptResult, AppError> {
        req.validate()?;

        let assessment = self.load_assessment(assessment_id).await?;

        let prior_count = self
            .attempts
            .count_by_student_and_assessment(student_id, assessment.id)
            .await?;
        if !assessment.can_attempt(prior_count) {
            tracing::warn!(
                student_id = %student_id,
                assessment_id = %assessment.id,
                prior_count,
                "Max attempts reached"
            );
            return Err(AppError::MaxAttemptsReached);
        }

        // Answers are built against a provisional id; the attempt rebinds them.
        let provisional = Uuid::new_v4();
        let answers = req
            .answers
            .into_iter()
            .map(|input| {
                Answer::new(
                    provisional,
                    input.question_id,
                    input.selected_answer_id,
                    input.is_correct,
                    input.time_spent_seconds,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut attempt = Attempt::new(
            assessment.id,
            student_id,
            answers,
            req.started_at,
            req.completed_at,
        )?;
        if let Some(key) = req.idempotency_key {
            attempt = attempt.with_idempotency_key(key)?;
        }

        if let Err(e) = self.attempts.save(&attempt).await {
            if e == AppError::DuplicateIdempotencyKey {
                tracing::warn!(student_id = %student_id, "Duplicate submission rejected");
            }
            return Err(e);
        }

        let can_retake = assessment.can_attempt(prior_count + 1);

        // The attempt is committed; a failing lookup must not turn it into an error.
        let previous_best_score = match self.previous_best_score(&attempt).await {
            Ok(best) => best,
            Err(e) => {
                tracing::warn!(attempt_id = %attempt.id, "Failed to load previous best score: {}", e);
                None
            }
        };

        Ok(build_result(&assessment, &attempt, can_retake, previous_best_score))
    }

    /// Re-reads one attempt of `student_id`.
    pub async fn attempt_result(
        &self,
        attempt_id: Uuid,
        student_id: Uuid,
    ) -> Result<AttemptResult, AppError> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("attempt".to_string()))?;

        if attempt.student_id != student_id {
            return Err(AppError::Forbidden(
                "attempt does not belong to user".to_string(),
            ));
        }

        let assessment = self.load_assessment(attempt.assessment_id).await?;

        let count = self
            .attempts
            .count_by_student_and_assessment(student_id, assessment.id)
            .await?;
        let previous_best_score = self.previous_best_score(&attempt).await?;

        Ok(build_result(
            &assessment,
            &attempt,
            assessment.can_attempt(count),
            previous_best_score,
        ))
    }

    /// Paginated history, newest first. Attempts whose assessment is gone are skipped.
    pub async fn attempt_history(
        &self,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<AttemptHistory, AppError> {
        let attempts = self
            .attempts
            .find_by_student(student_id, limit, offset)
            .await?;

        let mut summaries = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            let Some(assessment) = self.assessments.find_by_id(attempt.assessment_id).await? else {
                tracing::debug!(attempt_id = %attempt.id, "Skipping attempt of deleted assessment");
                continue;
            };

            summaries.push(AttemptSummary {
                attempt_id: attempt.id,
                assessment_id: assessment.id,
                material_id: assessment.material_id,
                title: assessment.title.clone(),
                score: attempt.score,
                max_score: attempt.max_score,
                passed: attempt.is_passed(assessment.pass_threshold),
                time_spent_seconds: attempt.time_spent_seconds,
                completed_at: attempt.completed_at,
            });
        }

        let page = if limit > 0 { offset.max(0) / limit + 1 } else { 1 };

        Ok(AttemptHistory {
            total_count: summaries.len(),
            attempts: summaries,
            page,
            limit,
        })
    }

    async fn load_assessment(&self, id: Uuid) -> Result<Assessment, AppError> {
        self.assessments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("assessment".to_string()))
    }

    /// Best score among the student's other attempts on the same assessment.
    async fn previous_best_score(&self, attempt: &Attempt) -> Result<Option<i32>, AppError> {
        let others = self
            .attempts
            .find_by_student_and_assessment(attempt.student_id, attempt.assessment_id)
            .await?;

        Ok(others
            .iter()
            .filter(|a| a.id != attempt.id)
            .map(|a| a.score)
            .max())
    }
}

fn build_result(
    assessment: &Assessment,
    attempt: &Attempt,
    can_retake: bool,
    previous_best_score: Option<i32>,
) -> AttemptResult {
    AttemptResult {
        attempt_id: attempt.id,
        assessment_id: assessment.id,
        score: attempt.score,
        max_score: attempt.max_score,
        correct_answers: attempt.correct_count(),
        total_questions: attempt.total_questions(),
        pass_threshold: assessment.pass_threshold,
        passed: attempt.is_passed(assessment.pass_threshold),
        time_spent_seconds: attempt.time_spent_seconds,
        started_at: attempt.started_at,
        completed_at: attempt.completed_at,
        can_retake,
        previous_best_score,
    }
}
