// src/services/mod.rs

pub mod attempt_service;
pub mod stats_service;

pub use attempt_service::AttemptService;
pub use stats_service::StatsService;
