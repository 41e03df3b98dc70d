// src/state.rs

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    repositories::{
        PgAnswerRepository, PgAssessmentRepository, PgAssessmentStats, PgAttemptRepository,
    },
    services::{AttemptService, StatsService},
};

/// Shared handles of the process: the pool and the loaded configuration.
/// Repositories hold a clone of the pool and nothing else.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self { pool, config }
    }

    pub fn assessment_repository(&self) -> PgAssessmentRepository {
        PgAssessmentRepository::new(self.pool.clone())
    }

    pub fn attempt_repository(&self) -> PgAttemptRepository {
        PgAttemptRepository::new(self.pool.clone())
    }

    pub fn answer_repository(&self) -> PgAnswerRepository {
        PgAnswerRepository::new(self.pool.clone())
    }

    pub fn stats_repository(&self) -> PgAssessmentStats {
        PgAssessmentStats::new(self.pool.clone())
    }

    pub fn attempt_service(&self) -> AttemptService {
        AttemptService::new(
            Arc::new(self.assessment_repository()),
            Arc::new(self.attempt_repository()),
        )
    }

    pub fn stats_service(&self) -> StatsService {
        StatsService::new(Arc::new(self.stats_repository()))
    }
}
