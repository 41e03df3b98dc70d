// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{MAX_IDEMPOTENCY_KEY_LEN, MAX_SCORE, MAX_TIME_SPENT_SECONDS, MAX_TOTAL_QUESTIONS},
    error::AppError,
    models::{answer::Answer, now, to_store_precision},
};

/// Immutable record of one completed attempt.
/// Represents the 'assessment_attempt' table joined with its answers.
///
/// There is no in-progress state: the caller gathers every answer first and then
/// builds the attempt, which derives `score` and `time_spent_seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub student_id: Uuid,

    /// `floor(correct * 100 / total)`, kept in sync with `answers`.
    pub score: i32,

    /// Always 100.
    pub max_score: i32,

    pub time_spent_seconds: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    /// Question order is insertion order.
    pub answers: Vec<Answer>,

    /// Unique across all attempts when present.
    pub idempotency_key: Option<String>,
}

/// Integer percentage of correct answers; zero for an empty slice.
pub fn calculate_score(answers: &[Answer]) -> i32 {
    if answers.is_empty() {
        return 0;
    }
    let correct = answers.iter().filter(|a| a.is_correct).count();
    ((correct * MAX_SCORE as usize) / answers.len()) as i32
}

impl Attempt {
    /// Builds a completed attempt and takes ownership of its answers,
    /// stamping the new attempt id on each of them.
    pub fn new(
        assessment_id: Uuid,
        student_id: Uuid,
        mut answers: Vec<Answer>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let started_at = to_store_precision(started_at);
        let completed_at = to_store_precision(completed_at);

        if assessment_id.is_nil() {
            return Err(AppError::InvalidAssessmentId);
        }
        if student_id.is_nil() {
            return Err(AppError::InvalidStudentId);
        }
        check_answer_count(answers.len())?;
        check_started_at(started_at)?;
        if completed_at <= started_at {
            return Err(AppError::InvalidEndTime);
        }

        let time_spent_seconds = elapsed_seconds(started_at, completed_at)?;
        check_time_spent(time_spent_seconds)?;

        let id = Uuid::new_v4();
        for answer in &mut answers {
            answer.attempt_id = id;
        }

        Ok(Self {
            id,
            assessment_id,
            student_id,
            score: calculate_score(&answers),
            max_score: MAX_SCORE,
            time_spent_seconds,
            started_at,
            completed_at,
            created_at: now(),
            answers,
            idempotency_key: None,
        })
    }

    /// Attaches the caller's idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Result<Self, AppError> {
        let key = key.into();
        if key.trim().is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(AppError::InvalidIdempotencyKey);
        }
        self.idempotency_key = Some(key);
        Ok(self)
    }

    /// Re-checks every invariant, including the derived score.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.is_nil() {
            return Err(AppError::InvalidAttemptId);
        }
        if self.assessment_id.is_nil() {
            return Err(AppError::InvalidAssessmentId);
        }
        if self.student_id.is_nil() {
            return Err(AppError::InvalidStudentId);
        }
        if !(0..=MAX_SCORE).contains(&self.score) || self.max_score != MAX_SCORE {
            return Err(AppError::InvalidScore);
        }
        check_time_spent(self.time_spent_seconds)?;
        check_started_at(self.started_at)?;
        if self.completed_at <= self.started_at {
            return Err(AppError::InvalidEndTime);
        }
        if elapsed_seconds(self.started_at, self.completed_at)? != self.time_spent_seconds {
            return Err(AppError::InvalidTimeSpent);
        }
        check_answer_count(self.answers.len())?;
        for answer in &self.answers {
            answer.validate()?;
            if answer.attempt_id != self.id {
                return Err(AppError::InvalidAttemptId);
            }
        }
        if let Some(key) = &self.idempotency_key {
            if key.trim().is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
                return Err(AppError::InvalidIdempotencyKey);
            }
        }

        let expected = calculate_score(&self.answers);
        if self.score != expected {
            return Err(AppError::ScoreMismatch {
                stored: self.score,
                expected,
            });
        }
        Ok(())
    }

    pub fn is_passed(&self, pass_threshold: i32) -> bool {
        self.score >= pass_threshold
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    pub fn incorrect_count(&self) -> usize {
        self.answers.len() - self.correct_count()
    }

    pub fn total_questions(&self) -> usize {
        self.answers.len()
    }

    pub fn accuracy_percentage(&self) -> i32 {
        self.score
    }

    pub fn average_time_per_question(&self) -> i32 {
        if self.answers.is_empty() {
            return 0;
        }
        self.time_spent_seconds / self.answers.len() as i32
    }
}

fn check_answer_count(count: usize) -> Result<(), AppError> {
    if count == 0 {
        return Err(AppError::NoAnswersProvided);
    }
    if count > MAX_TOTAL_QUESTIONS as usize {
        return Err(AppError::TooManyAnswers);
    }
    Ok(())
}

fn check_started_at(started_at: DateTime<Utc>) -> Result<(), AppError> {
    if started_at <= DateTime::<Utc>::UNIX_EPOCH {
        return Err(AppError::InvalidStartTime);
    }
    Ok(())
}

fn check_time_spent(seconds: i32) -> Result<(), AppError> {
    if seconds <= 0 || seconds > MAX_TIME_SPENT_SECONDS {
        return Err(AppError::InvalidTimeSpent);
    }
    Ok(())
}

fn elapsed_seconds(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Result<i32, AppError> {
    i32::try_from((completed_at - started_at).num_seconds()).map_err(|_| AppError::InvalidTimeSpent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn answers(correct: &[bool]) -> Vec<Answer> {
        let provisional = Uuid::new_v4();
        correct
            .iter()
            .enumerate()
            .map(|(i, ok)| Answer::new(provisional, format!("q{}", i + 1), "opt", *ok, 10).unwrap())
            .collect()
    }

    fn build(correct: &[bool], seconds: i64) -> Result<Attempt, AppError> {
        let started = Utc::now() - Duration::hours(1);
        Attempt::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            answers(correct),
            started,
            started + Duration::seconds(seconds),
        )
    }

    #[test]
    fn test_score_calculation_scenario() {
        let attempt = build(&[true, false, true, false, true], 300).unwrap();
        assert_eq!(attempt.score, 60);
        assert_eq!(attempt.max_score, 100);
        assert_eq!(attempt.time_spent_seconds, 300);
        assert!(attempt.is_passed(60));
        assert!(!attempt.is_passed(61));
        assert_eq!(attempt.correct_count(), 3);
        assert_eq!(attempt.incorrect_count(), 2);
        assert_eq!(attempt.total_questions(), 5);
        assert_eq!(attempt.average_time_per_question(), 60);
        assert!(attempt.validate().is_ok());
    }

    #[test]
    fn test_score_uses_integer_division() {
        let attempt = build(&[true, true, false], 60).unwrap();
        assert_eq!(attempt.score, 66);

        let attempt = build(&[false, false], 60).unwrap();
        assert_eq!(attempt.score, 0);

        let attempt = build(&[true], 60).unwrap();
        assert_eq!(attempt.score, 100);
    }

    #[test]
    fn test_answers_bound_to_new_attempt() {
        let attempt = build(&[true, false], 60).unwrap();
        assert!(attempt.answers.iter().all(|a| a.attempt_id == attempt.id));
        assert_eq!(attempt.answers[0].question_id, "q1");
        assert_eq!(attempt.answers[1].question_id, "q2");
    }

    #[test]
    fn test_time_spent_boundaries() {
        for (seconds, ok) in [(-1i64, false), (0, false), (1, true), (7200, true), (7201, false)] {
            let res = build(&[true], seconds);
            assert_eq!(res.is_ok(), ok, "seconds = {}", seconds);
        }
        assert_eq!(build(&[true], 7201).unwrap_err(), AppError::InvalidTimeSpent);
        assert_eq!(build(&[true], 0).unwrap_err(), AppError::InvalidEndTime);
    }

    #[test]
    fn test_answer_count_cap() {
        assert!(build(&[true; 100], 60).is_ok());
        assert_eq!(build(&[true; 101], 60).unwrap_err(), AppError::TooManyAnswers);

        let mut attempt = build(&[true], 60).unwrap();
        let extra = attempt.answers[0].clone();
        attempt.answers.extend(std::iter::repeat_n(extra, 100));
        assert_eq!(attempt.validate(), Err(AppError::TooManyAnswers));
    }

    #[test]
    fn test_sub_second_attempt_is_rejected() {
        let started = Utc::now() - Duration::minutes(1);
        let res = Attempt::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            answers(&[true]),
            started,
            started + Duration::milliseconds(500),
        );
        assert_eq!(res.unwrap_err(), AppError::InvalidTimeSpent);
    }

    #[test]
    fn test_constructor_error_order() {
        let now = Utc::now();
        let err = Attempt::new(Uuid::nil(), Uuid::nil(), vec![], now, now).unwrap_err();
        assert_eq!(err, AppError::InvalidAssessmentId);

        let err = Attempt::new(Uuid::new_v4(), Uuid::nil(), vec![], now, now).unwrap_err();
        assert_eq!(err, AppError::InvalidStudentId);

        let err = Attempt::new(Uuid::new_v4(), Uuid::new_v4(), vec![], now, now).unwrap_err();
        assert_eq!(err, AppError::NoAnswersProvided);

        let err = Attempt::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            answers(&[true]),
            DateTime::<Utc>::UNIX_EPOCH,
            now,
        )
        .unwrap_err();
        assert_eq!(err, AppError::InvalidStartTime);
    }

    #[test]
    fn test_validate_detects_score_tampering() {
        let mut attempt = build(&[true, false, true, false, true], 300).unwrap();
        attempt.score = 80;
        assert_eq!(
            attempt.validate(),
            Err(AppError::ScoreMismatch {
                stored: 80,
                expected: 60
            })
        );

        let mut attempt = build(&[true, false], 60).unwrap();
        attempt.answers[1].is_correct = true;
        assert!(matches!(attempt.validate(), Err(AppError::ScoreMismatch { .. })));
    }

    #[test]
    fn test_validate_range_checks() {
        let mut attempt = build(&[true], 60).unwrap();
        attempt.score = 101;
        assert_eq!(attempt.validate(), Err(AppError::InvalidScore));

        let mut attempt = build(&[true], 60).unwrap();
        attempt.time_spent_seconds = 61;
        assert_eq!(attempt.validate(), Err(AppError::InvalidTimeSpent));

        let mut attempt = build(&[true], 60).unwrap();
        attempt.answers.clear();
        assert_eq!(attempt.validate(), Err(AppError::NoAnswersProvided));

        let mut attempt = build(&[true], 60).unwrap();
        attempt.answers[0].attempt_id = Uuid::new_v4();
        assert_eq!(attempt.validate(), Err(AppError::InvalidAttemptId));
    }

    #[test]
    fn test_idempotency_key() {
        let attempt = build(&[true], 60).unwrap().with_idempotency_key("k1").unwrap();
        assert_eq!(attempt.idempotency_key.as_deref(), Some("k1"));
        assert!(attempt.validate().is_ok());

        assert_eq!(
            build(&[true], 60).unwrap().with_idempotency_key("").unwrap_err(),
            AppError::InvalidIdempotencyKey
        );
        assert_eq!(
            build(&[true], 60)
                .unwrap()
                .with_idempotency_key("k".repeat(65))
                .unwrap_err(),
            AppError::InvalidIdempotencyKey
        );
    }

    #[test]
    fn test_average_time_with_no_answers() {
        let mut attempt = build(&[true], 90).unwrap();
        attempt.answers.clear();
        assert_eq!(attempt.average_time_per_question(), 0);
    }
}
