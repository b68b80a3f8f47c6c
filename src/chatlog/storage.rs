use super::ChatLogEntry;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct ChatLog {
    path: PathBuf,
    // Serializes appends so concurrent requests never interleave lines.
    write_lock: Mutex<()>,
}

impl ChatLog {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                Error::chat_log(format!(
                    "Failed to create log directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        info!("Chat log: {}", path.display());

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as a single newline-terminated JSON line.
    ///
    /// The file is opened and closed per call.
    pub async fn append(&self, entry: &ChatLogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::chat_log(format!("Failed to open {}: {e}", self.path.display()))
            })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::chat_log(format!("Failed to write entry: {e}")))?;
        file.flush()
            .await
            .map_err(|e| Error::chat_log(format!("Failed to flush entry: {e}")))?;

        debug!("Appended chat log entry ({} bytes)", line.len());
        Ok(())
    }

    /// Reads every entry back in file order. A missing file is an empty log.
    pub async fn read_all(&self) -> Result<Vec<ChatLogEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(user: &str, response: &str) -> ChatLogEntry {
        ChatLogEntry::new(
            "You are a helpful assistant.".to_string(),
            user.to_string(),
            response.to_string(),
        )
    }

    #[tokio::test]
    async fn test_new_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("nested").join("chatlog.jsonl");

        let log = ChatLog::new(&path).await.unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists()); // created lazily on first append
        assert_eq!(log.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_append_writes_one_line_per_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatlog.jsonl");
        let log = ChatLog::new(&path).await.unwrap();

        log.append(&entry("What is 2+2?", "4")).await.unwrap();
        log.append(&entry("What is 3+3?", "6")).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.ends_with('\n'));
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["user_prompt"], "What is 2+2?");
        assert_eq!(first["system_prompt"], "You are a helpful assistant.");
        assert_eq!(first["response"], "4");
        assert!(first["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_identical_entries_are_not_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        let log = ChatLog::new(temp_dir.path().join("chatlog.jsonl"))
            .await
            .unwrap();

        let e = entry("Hello", "Hi");
        log.append(&e).await.unwrap();
        log.append(&e).await.unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entries[1]);
    }

    #[tokio::test]
    async fn test_append_preserves_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatlog.jsonl");

        let first = ChatLog::new(&path).await.unwrap();
        first.append(&entry("one", "1")).await.unwrap();
        drop(first);

        let second = ChatLog::new(&path).await.unwrap();
        second.append(&entry("two", "2")).await.unwrap();

        let entries = second.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_prompt, "one");
        assert_eq!(entries[1].user_prompt, "two");
    }

    #[tokio::test]
    async fn test_read_all_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let log = ChatLog::new(temp_dir.path().join("never-written.jsonl"))
            .await
            .unwrap();

        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multiline_content_stays_on_one_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatlog.jsonl");
        let log = ChatLog::new(&path).await.unwrap();

        log.append(&entry("line one\nline two", "a\nb\nc"))
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw.lines().count(), 1);

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries[0].response, "a\nb\nc");
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(
            ChatLog::new(temp_dir.path().join("chatlog.jsonl"))
                .await
                .unwrap(),
        );

        let mut handles = vec![];
        for i in 0..20 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                let big = "x".repeat(4096);
                log.append(&entry(&format!("prompt {i}"), &big)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Every line must parse on its own.
        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.response.len() == 4096));
    }

    #[tokio::test]
    async fn test_append_fails_when_path_is_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log = ChatLog::new(temp_dir.path()).await.unwrap();

        let err = log.append(&entry("hi", "there")).await.unwrap_err();
        assert!(matches!(err, Error::ChatLog(_)));
    }
}
