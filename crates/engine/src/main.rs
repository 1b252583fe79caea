//! NetEvent Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netevent_engine::app::{App, StorePorts};
use netevent_engine::infrastructure::{
    clock::SystemClock,
    config::{AppConfig, StoreBackend},
    memory::InMemoryStore,
    neo4j::{ensure_schema, Neo4jGraph, Neo4jRepositories},
    ports::{ClockPort, SagaLogPort},
    saga_log::SqliteSagaLog,
};
use netevent_engine::api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netevent_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NetEvent Engine");

    let config = AppConfig::from_env()?;
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    let (ports, saga_log): (StorePorts, Arc<dyn SagaLogPort>) = match config.store_backend {
        StoreBackend::Neo4j => {
            tracing::info!("Connecting to Neo4j at {}", config.neo4j_uri);
            let graph =
                neo4rs::Graph::new(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
                    .await?;
            let graph = Neo4jGraph::new(graph).with_timeout(config.store_timeout);

            // Ensure database schema (constraints and indexes)
            ensure_schema(&graph).await?;

            let saga_log: Arc<dyn SagaLogPort> = Arc::new(SqliteSagaLog::new(&config.saga_db).await?);
            tracing::info!(path = %config.saga_db, "Saga journal opened");
            (Neo4jRepositories::new(graph, clock.clone()).into(), saga_log)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            let store = Arc::new(InMemoryStore::new(clock.clone()).with_open_references());
            let saga_log: Arc<dyn SagaLogPort> = store.clone();
            (store.into(), saga_log)
        }
    };

    let app = Arc::new(App::new(ports, saga_log, clock, config.operation_deadline));

    // Resolve composite writes a previous run left half done.
    match app.use_cases.events.recover.execute().await {
        Ok(report) if !report.needs_attention.is_empty() || !report.failed.is_empty() => {
            tracing::warn!(
                needs_attention = ?report.needs_attention,
                failed = ?report.failed,
                "Some interrupted event writes could not be resolved"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Saga recovery failed"),
    }

    let mut router = api::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

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

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

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
