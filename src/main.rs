use anyhow::Result;
use local_chat::{config, server};
use tracing::info;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG may hold a full filter directive; only the config level is validated
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) => tracing_subscriber::EnvFilter::try_new(&directive)
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG '{}': {}", directive, e))?,
        Err(_) => {
            validate_log_level(&config.server.logs.level)?;
            tracing_subscriber::EnvFilter::try_new(&config.server.logs.level)?
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting local chat server");
    info!(
        "Model: {} (context {}, {} threads)",
        config.model.path, config.model.context_size, config.model.threads
    );

    // Any error here happens before the listener is bound and exits non-zero
    server::run(config).await?;

    Ok(())
}
