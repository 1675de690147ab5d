use anyhow::Result;
use rawg_insight::config::AppConfig;
use rawg_insight::db::Database;
use rawg_insight::llm::CompletionClient;
use rawg_insight::pipeline::QueryPipeline;
use rawg_insight::web::{self, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let completion = CompletionClient::new(&config.completion)?;
    let database = Database::new(config.database.clone(), config.policy.statement_timeout_ms);
    let pipeline = QueryPipeline::new(config.policy.clone(), completion, database)?;

    let state = Arc::new(AppState { pipeline });

    web::serve(&config.bind_host, config.bind_port, state).await
}
