use crate::config::GenerationConfig;

/// Sampling settings handed to every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub repeat_penalty: f32,
    pub seed: Option<u32>,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            stop: config.stop.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            repeat_penalty: config.repeat_penalty,
            seed: config.seed,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

/// Builds the single prompt string fed to the model.
///
/// The trailing `AI:` cues the model to answer as the assistant.
pub fn compose_prompt(system: &str, prompt: &str) -> String {
    format!("{system}\nUser: {prompt}\nAI:")
}
