#![allow(dead_code)]

use local_chat::{
    Error, Result,
    llm::{GenerationParams, TextGenerator},
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock generator for testing
///
/// Returns queued responses in order, then falls back to a fixed reply.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub fallback: String,
    pub error: Option<String>,
    pub delay: Duration,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fallback: "mock response".to_string(),
            error: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        *self.responses.lock().unwrap() = responses.into_iter().map(String::from).collect();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if let Some(ref error) = self.error {
            return Err(Error::inference(error.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(self.fallback.clone());
        }
        Ok(responses.remove(0))
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}
