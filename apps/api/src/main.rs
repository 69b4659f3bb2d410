mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod profiles;
mod routes;
mod state;
mod tenant;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::llm_client::LlmClient;
use crate::matching::matcher::GeminiMatcher;
use crate::matching::orchestrator::ScoreOrchestrator;
use crate::matching::store::PgScoreStore;
use crate::profiles::repository::PgProfileRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize matcher
    let llm = LlmClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.matcher_timeout_secs),
    )?;
    info!(
        "Matcher initialized (model: {}, concurrency: {}, staleness: {}d)",
        llm.model(),
        config.matcher_concurrency,
        config.score_staleness_days
    );
    let matcher = Arc::new(GeminiMatcher::new(llm));

    let profiles = Arc::new(PgProfileRepository::new(db.clone()));
    let scores = Arc::new(PgScoreStore::new(db));
    let orchestrator = Arc::new(ScoreOrchestrator::new(
        profiles.clone(),
        scores.clone(),
        matcher,
        chrono::Duration::days(config.score_staleness_days),
        config.matcher_concurrency,
    ));

    let state = AppState {
        config: config.clone(),
        profiles,
        scores,
        orchestrator,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
