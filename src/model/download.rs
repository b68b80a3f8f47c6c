use super::is_present;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("local-chat/", env!("CARGO_PKG_VERSION"));

/// Downloads `url` to `path` unless a non-empty file is already there.
///
/// The body is streamed into `<path>.part` and renamed into place once
/// complete, so `path` never holds a truncated artifact. No retries.
pub async fn ensure_model(path: &Path, url: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::download(format!("Failed to create {}: {e}", dir.display()))
        })?;
    }

    if is_present(path).await {
        debug!("Model already exists: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let temp_path = part_path(path);
    match fetch(url, &temp_path).await {
        Ok(bytes) => {
            tokio::fs::rename(&temp_path, path).await.map_err(|e| {
                Error::download(format!("Failed to move downloaded file into place: {e}"))
            })?;
            info!("Download complete: {} ({})", path.display(), format_size(bytes));
            Ok(path.to_path_buf())
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

async fn fetch(url: &str, temp_path: &Path) -> Result<u64> {
    info!("Downloading model from: {}", url);

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::download(format!("Request to {url} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::download(format!(
            "Download failed with status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length();
    match total_size {
        Some(total) => info!("File size: {}", format_size(total)),
        None => info!("File size unknown"),
    }

    let mut file = File::create(temp_path).await.map_err(|e| {
        Error::download(format!("Failed to create {}: {e}", temp_path.display()))
    })?;

    let mut downloaded: u64 = 0;
    let mut next_report: u64 = 5;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::download(format!("Download interrupted: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::download(format!("Write error: {e}")))?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size.filter(|t| *t > 0) {
            let percent = downloaded * 100 / total;
            if percent >= next_report {
                info!(
                    "Downloaded {}% ({} / {})",
                    percent,
                    format_size(downloaded),
                    format_size(total)
                );
                next_report = percent - percent % 5 + 5;
            }
        }
    }

    file.flush()
        .await
        .map_err(|e| Error::download(format!("Write error: {e}")))?;

    if let Some(total) = total_size
        && downloaded != total
    {
        return Err(Error::download(format!(
            "Download incomplete: got {downloaded} bytes, expected {total}"
        )));
    }

    Ok(downloaded)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 {
        format!("{} B", bytes as u64)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}
