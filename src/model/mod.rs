//! Makes sure the model artifact is on disk before the engine loads it.

mod download;

pub use download::{ensure_model, format_size};

use crate::{Error, Result, config::ModelConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolves the configured model to a local file, downloading it first when
/// allowed. An existing file never triggers network access.
pub async fn provision(config: &ModelConfig) -> Result<PathBuf> {
    let path = Path::new(&config.path);

    if is_present(path).await {
        info!("Model present: {}", path.display());
        return Ok(path.to_path_buf());
    }

    if !config.download {
        return Err(Error::ModelNotFound {
            path: config.path.clone(),
        });
    }

    ensure_model(path, &config.url).await
}

/// A zero-length file counts as absent.
pub(crate) async fn is_present(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
