// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{
        EXTERNAL_DOCUMENT_ID_LEN, MAX_PASS_THRESHOLD, MAX_TIME_LIMIT_MINUTES, MAX_TOTAL_QUESTIONS,
        MIN_PASS_THRESHOLD, MIN_TIME_LIMIT_MINUTES, MIN_TOTAL_QUESTIONS,
    },
    error::AppError,
    models::now,
};

/// Lifecycle of an assessment, stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentStatus {
    #[default]
    Generated,
    Published,
    Archived,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Generated => "generated",
            AssessmentStatus::Published => "published",
            AssessmentStatus::Archived => "archived",
        }
    }

    /// Unknown values read from the store fall back to `Generated`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "published" => AssessmentStatus::Published,
            "archived" => AssessmentStatus::Archived,
            _ => AssessmentStatus::Generated,
        }
    }
}

/// Definition of an evaluation attached to a learning material.
/// Represents the 'assessment' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub material_id: Uuid,

    /// Hex identifier of the question document in the external document store.
    pub external_document_id: String,

    pub title: String,
    pub total_questions: i32,

    /// Percentage (0-100) an attempt must reach to pass.
    pub pass_threshold: i32,

    /// `None` means unlimited attempts.
    pub max_attempts: Option<i32>,

    /// `None` means no time cap.
    pub time_limit_minutes: Option<i32>,

    pub status: AssessmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Builds a new assessment, failing on the first broken invariant.
    pub fn new(
        material_id: Uuid,
        external_document_id: impl Into<String>,
        title: impl Into<String>,
        total_questions: i32,
        pass_threshold: i32,
    ) -> Result<Self, AppError> {
        let external_document_id = external_document_id.into();
        let title = title.into();

        check_material_id(material_id)?;
        check_external_document_id(&external_document_id)?;
        check_title(&title)?;
        check_total_questions(total_questions)?;
        check_pass_threshold(pass_threshold)?;

        let now = now();
        Ok(Self {
            id: Uuid::new_v4(),
            material_id,
            external_document_id,
            title,
            total_questions,
            pass_threshold,
            max_attempts: None,
            time_limit_minutes: None,
            status: AssessmentStatus::Generated,
            created_at: now,
            updated_at: now,
        })
    }

    /// Re-checks every invariant against the current field values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.is_nil() {
            return Err(AppError::InvalidAssessmentId);
        }
        check_material_id(self.material_id)?;
        check_external_document_id(&self.external_document_id)?;
        check_title(&self.title)?;
        check_total_questions(self.total_questions)?;
        check_pass_threshold(self.pass_threshold)?;
        if let Some(max) = self.max_attempts {
            check_max_attempts(max)?;
        }
        if let Some(minutes) = self.time_limit_minutes {
            check_time_limit(minutes)?;
        }
        if self.updated_at < self.created_at {
            return Err(AppError::InvalidUpdatedAt);
        }
        Ok(())
    }

    /// Whether a student with `prior_count` attempts may start another one.
    pub fn can_attempt(&self, prior_count: i64) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => prior_count < i64::from(max),
        }
    }

    pub fn is_time_limited(&self) -> bool {
        matches!(self.time_limit_minutes, Some(minutes) if minutes > 0)
    }

    pub fn set_max_attempts(&mut self, max: i32) -> Result<(), AppError> {
        check_max_attempts(max)?;
        self.max_attempts = Some(max);
        self.touch();
        Ok(())
    }

    pub fn set_time_limit(&mut self, minutes: i32) -> Result<(), AppError> {
        check_time_limit(minutes)?;
        self.time_limit_minutes = Some(minutes);
        self.touch();
        Ok(())
    }

    pub fn remove_max_attempts(&mut self) {
        self.max_attempts = None;
        self.touch();
    }

    pub fn remove_time_limit(&mut self) {
        self.time_limit_minutes = None;
        self.touch();
    }

    pub fn set_status(&mut self, status: AssessmentStatus) {
        self.status = status;
        self.touch();
    }

    /// Advances `updated_at`, strictly, even when the clock has not moved.
    fn touch(&mut self) {
        let now = now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

fn check_material_id(material_id: Uuid) -> Result<(), AppError> {
    if material_id.is_nil() {
        return Err(AppError::InvalidMaterialId);
    }
    Ok(())
}

fn check_external_document_id(id: &str) -> Result<(), AppError> {
    if id.len() != EXTERNAL_DOCUMENT_ID_LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidExternalDocumentId);
    }
    Ok(())
}

fn check_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::EmptyTitle);
    }
    Ok(())
}

fn check_total_questions(total: i32) -> Result<(), AppError> {
    if !(MIN_TOTAL_QUESTIONS..=MAX_TOTAL_QUESTIONS).contains(&total) {
        return Err(AppError::InvalidTotalQuestions);
    }
    Ok(())
}

fn check_pass_threshold(threshold: i32) -> Result<(), AppError> {
    if !(MIN_PASS_THRESHOLD..=MAX_PASS_THRESHOLD).contains(&threshold) {
        return Err(AppError::InvalidPassThreshold);
    }
    Ok(())
}

fn check_max_attempts(max: i32) -> Result<(), AppError> {
    if max < 1 {
        return Err(AppError::InvalidMaxAttempts);
    }
    Ok(())
}

fn check_time_limit(minutes: i32) -> Result<(), AppError> {
    if !(MIN_TIME_LIMIT_MINUTES..=MAX_TIME_LIMIT_MINUTES).contains(&minutes) {
        return Err(AppError::InvalidTimeLimit);
    }
    Ok(())
}
