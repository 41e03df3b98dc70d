// src/main.rs

use assessment_core::config::Config;
use assessment_core::state::AppState;
use assessment_core::utils::db::{connect_with_retry, run_migrations};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (and .env, if present)
    let config = Config::from_env().expect("Failed to load configuration");

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "assessment-core.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = connect_with_retry(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connected...");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let state = AppState::new(pool, config);

    match state.stats_service().global_stats().await {
        Ok(stats) => match serde_json::to_string(&stats) {
            Ok(json) => tracing::info!("Assessment stats: {}", json),
            Err(e) => tracing::error!("Failed to serialize stats: {:?}", e),
        },
        Err(e) => {
            tracing::error!("Failed to compute stats: {}", e);
            // Flush the file writer before exiting.
            drop(guard);
            std::process::exit(1);
        }
    }
}
