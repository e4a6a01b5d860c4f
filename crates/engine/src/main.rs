//! Taleweaver Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taleweaver_engine::api;
use taleweaver_engine::infrastructure::clock::SystemClock;
use taleweaver_engine::infrastructure::config::EngineConfig;
use taleweaver_engine::infrastructure::llm::build_llm;
use taleweaver_engine::infrastructure::ports::{AdventureRepo, ClockPort};
use taleweaver_engine::infrastructure::sqlite::SqliteStore;
use taleweaver_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (Taskfile runs the engine from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taleweaver_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taleweaver Engine");

    let config = EngineConfig::from_env().map_err(anyhow::Error::msg)?;

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    tracing::info!(path = %config.database_path, "Opening SQLite database");
    let store = SqliteStore::connect(&config.database_path, clock.clone())
        .await
        .context("failed to open the database")?;

    // A crash mid-turn leaves runs latched as waiting on the model
    let reset = store
        .reset_stale_waiting_flags()
        .await
        .context("failed to reset stale waiting flags")?;
    tracing::info!(count = reset, "Reset stale waiting flags");

    tracing::info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "LLM gateway configured"
    );
    let llm = build_llm(&config.llm);

    let app = Arc::new(App::new(store, llm, clock, config.narrative));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        // Browser clients send X-User-Id and JSON bodies, both of which trigger preflights.
        .allow_headers([
            HeaderName::from_static(api::http::USER_ID_HEADER),
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
