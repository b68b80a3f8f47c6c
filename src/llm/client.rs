use super::types::GenerationParams;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Blocking text generation over a loaded model.
#[cfg_attr(test, mockall::automock)]
pub trait TextGenerator: Send + Sync {
    /// Runs a full generation for `prompt` and returns the continuation.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Async front over a [`TextGenerator`] that allows one generation at a time.
///
/// Generations run on the blocking thread pool. The lock travels into the
/// blocking task, so a request that gives up on its deadline still keeps
/// later requests waiting until the engine is actually free.
pub struct Inference {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
    timeout: Option<Duration>,
    lock: Arc<Mutex<()>>,
}

impl Inference {
    pub fn new(generator: Arc<dyn TextGenerator>, params: GenerationParams) -> Self {
        Self {
            generator,
            params,
            timeout: None,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Deadline covering both the wait for the engine and the generation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn generate(&self, prompt: String) -> Result<String> {
        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(prompt))
                .await
                .map_err(|_| {
                    warn!("Generation exceeded {:?}", limit);
                    Error::Timeout {
                        seconds: limit.as_secs(),
                    }
                })??,
            None => self.run(prompt).await?,
        };

        Ok(text.trim().to_string())
    }

    async fn run(&self, prompt: String) -> Result<String> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let generator = Arc::clone(&self.generator);
        let params = self.params.clone();

        debug!("Starting generation ({} prompt bytes)", prompt.len());

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            generator.generate(&prompt, &params)
        })
        .await
        .map_err(|e| Error::internal(format!("Generation task failed: {e}")))?
    }
}
