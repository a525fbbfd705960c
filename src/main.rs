use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

mod auth;
mod config;
mod db;
mod engine;
mod error;
mod handlers;
mod models;
mod prompts;
mod routes;
mod store;

use config::{Config, StoreBackend};
use engine::MoodEngine;
use prompts::{ClaudePromptGenerator, PromptGenerator};
use store::{MemoryStore, MoodStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MoodStore>,
    pub engine: MoodEngine,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<String>>,
    pub prompts: Arc<dyn PromptGenerator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodarc_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn MoodStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let db = db::create_pool(url)
                .await
                .context("Failed to create database pool")?;

            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let prompts: Arc<dyn PromptGenerator> = Arc::new(ClaudePromptGenerator::new(&config)?);
    if config.claude_api_key.is_empty() {
        tracing::info!("CLAUDE_API_KEY not set, journal prompts will use templates");
    }

    // WebSocket broadcast channel
    let (ws_tx, _) = broadcast::channel::<String>(256);

    let state = AppState {
        engine: MoodEngine::new(store.clone()),
        store,
        config: config.clone(),
        ws_tx: Some(ws_tx),
        prompts,
    };

    let app = routes::router(state, cors_layer(&config)?);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config
        .frontend_url
        .parse::<axum::http::HeaderValue>()
        .context("FRONTEND_URL is not a valid origin")?];
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true))
}
