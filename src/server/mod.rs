pub mod handlers;
pub mod types;

pub use handlers::AppState;

use crate::{
    Error, Result,
    chatlog::ChatLog,
    config::Config,
    llm::{GenerationParams, Inference, LlamaEngine},
    model,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Provisions and loads the model, then serves until Ctrl-C.
///
/// Every error returned before the listener is bound is a startup failure.
pub async fn run(config: Config) -> Result<()> {
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let chat_log = ChatLog::new(&config.server.chat_log_path).await?;

    let model_path = model::provision(&config.model).await?;
    let model_name = model_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| config.model.path.clone());

    let model_config = config.model.clone();
    let engine = tokio::task::spawn_blocking(move || LlamaEngine::load(&model_config))
        .await
        .map_err(|e| Error::internal(format!("Model loading task failed: {e}")))??;

    let inference = Inference::new(
        Arc::new(engine),
        GenerationParams::from(&config.generation),
    )
    .with_timeout(config.generation.timeout_secs.map(Duration::from_secs));

    let app_state = AppState {
        inference: Arc::new(inference),
        chat_log: Arc::new(chat_log),
        model_name,
    };

    let app = router(app_state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
