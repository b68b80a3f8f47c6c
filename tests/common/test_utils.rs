#![allow(dead_code)]

use super::mocks::MockGenerator;
use axum::Router;
use local_chat::{
    Result,
    chatlog::ChatLog,
    config::Config,
    llm::{GenerationParams, Inference},
    server::{self, AppState},
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::fs;

/// Create a test configuration with sensible defaults
pub fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.chat_log_path = dir
        .path()
        .join("logs")
        .join("chatlog.jsonl")
        .to_string_lossy()
        .to_string();
    config.model.path = dir
        .path()
        .join("models")
        .join("test.gguf")
        .to_string_lossy()
        .to_string();
    config.model.download = false;
    config
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test config YAML file
pub async fn create_test_config_file(dir: &TempDir, content: &str) -> Result<String> {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await?;
    Ok(config_path.to_string_lossy().to_string())
}

/// Build app state around a mock generator, logging into `dir`
pub async fn create_test_state(
    generator: MockGenerator,
    dir: &TempDir,
    timeout: Option<Duration>,
) -> AppState {
    let chat_log = ChatLog::new(dir.path().join("logs").join("chatlog.jsonl"))
        .await
        .expect("Failed to create chat log");

    let inference = Inference::new(Arc::new(generator), GenerationParams::default())
        .with_timeout(timeout);

    AppState {
        inference: Arc::new(inference),
        chat_log: Arc::new(chat_log),
        model_name: "test.gguf".to_string(),
    }
}

/// Full router around a mock generator
pub async fn create_test_app(generator: MockGenerator) -> (Router, AppState, TempDir) {
    let temp_dir = create_temp_dir();
    let state = create_test_state(generator, &temp_dir, None).await;
    (server::router(state.clone()), state, temp_dir)
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
model:
  path: "models/tiny.gguf"
  url: "http://localhost:8000/tiny.gguf"
  download: false
  context_size: 1024
  threads: 2

generation:
  max_tokens: 128
  stop: ["User:", "AI:", "</s>"]
  timeout_secs: 60

server:
  host: "0.0.0.0"
  port: 8080
  chat_log_path: "/tmp/chatlog.jsonl"
  logs:
    level: "debug"
"#;

/// Invalid configuration YAML for testing error cases
pub const INVALID_CONFIG_YAML: &str = r#"
model:
  context_size: "not-a-number"
server:
  port: -1
"#;
