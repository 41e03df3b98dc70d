// src/services/stats_service.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        now,
        stats::{GlobalStats, QuestionDifficulty},
    },
    repositories::AssessmentStats,
};

#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn AssessmentStats>,
}

impl StatsService {
    pub fn new(stats: Arc<dyn AssessmentStats>) -> Self {
        Self { stats }
    }

    /// Runs the four global aggregates concurrently.
    pub async fn global_stats(&self) -> Result<GlobalStats, AppError> {
        let (completed, average_score, active_users, average_progress) = tokio::try_join!(
            self.stats.count_completed_assessments(),
            self.stats.calculate_average_score(),
            self.stats.count_active_users(),
            self.stats.calculate_average_progress(),
        )?;

        tracing::debug!(completed, active_users, "Global stats computed");

        Ok(GlobalStats {
            total_completed_assessments: completed,
            average_assessment_score: average_score,
            active_users_last_30_days: active_users,
            average_progress,
            generated_at: now(),
        })
    }

    pub async fn question_difficulty(&self, question_id: &str) -> Result<QuestionDifficulty, AppError> {
        if question_id.is_empty() {
            return Err(AppError::InvalidQuestionId);
        }
        self.stats.question_difficulty(question_id).await
    }
}
