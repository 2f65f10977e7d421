//! BabyGuard Backend
//!
//! REST API server for the baby/pregnancy-care chat assistant. Wires the
//! assistant pipeline to its collaborators and exposes the chat-session
//! endpoints.

mod api;
mod assistant;
mod care;
mod chat;
mod config;
mod embedding;
mod error;
mod llm;

use assistant::{
    Assistant, Composer, InMemoryKnowledgeStore, KnowledgeRetriever, SafetyPolicy, SessionMemory,
    WebSearcher,
};
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use care::SqliteCareData;
use chat::ChatDb;
use config::Config;
use embedding::EmbeddingClient;
use llm::GroqClient;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Build the assistant pipeline from configuration
fn build_assistant(config: &config::AssistantConfig, chat_db: &ChatDb) -> Assistant {
    let llm = Arc::new(GroqClient::new(
        config.groq_api_key.clone(),
        config.groq_model.clone(),
        config.model_timeout_secs,
    ));
    let composer = Composer::new(llm.clone());

    let embedder = EmbeddingClient::new(
        config.embeddings_url.clone(),
        config.embeddings_api_key.clone(),
        config.embeddings_model.clone(),
    );
    let store = Arc::new(InMemoryKnowledgeStore::load(&config.knowledge_path));
    let retriever = KnowledgeRetriever::new(store, embedder, llm.clone(), composer.clone());

    let searcher = WebSearcher::new(
        config.search_api_key.clone(),
        config.search_engine_id.clone(),
        composer.clone(),
    );

    let care = Arc::new(SqliteCareData::new(chat_db.pool().clone()));

    Assistant::new(
        llm,
        composer,
        retriever,
        searcher,
        SafetyPolicy::default(),
        care,
        SessionMemory::new(),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config.server);

    // Initialize storage and the assistant pipeline
    let chat_db = Arc::new(ChatDb::new(&config.database.path).await?);
    let assistant = Arc::new(build_assistant(&config.assistant, &chat_db));

    let state = (chat_db, assistant);

    // Build our application with routes
    let app = Router::new()
        // Health check
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        // Chat session API
        .route(
            "/api/chat/sessions",
            get(api::sessions::list_sessions).post(api::sessions::create_session),
        )
        .route(
            "/api/chat/sessions/:id",
            delete(api::sessions::delete_session),
        )
        .route(
            "/api/chat/sessions/:id/messages",
            get(api::sessions::get_messages),
        )
        .route("/api/chat/sessions/:id/send", post(api::sessions::send_message))
        .route("/api/chat/sessions/:id/end", post(api::sessions::end_session))
        .route("/api/chat/sessions/:id/topic", put(api::sessions::update_topic))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive()) // Allow CORS for development
        .with_state(state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("🚀 Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
