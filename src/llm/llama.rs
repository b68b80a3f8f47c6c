use super::client::TextGenerator;
use super::completion::Completion;
use super::types::GenerationParams;
use crate::{Error, Result, config::ModelConfig};
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::{LogOptions, send_logs_to_tracing};
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Repeat penalty looks back over this many tokens.
const PENALTY_LAST_N: i32 = 64;

/// A GGUF model loaded once and kept for the life of the process.
pub struct LlamaEngine {
    backend: LlamaBackend,
    model: LlamaModel,
    context_size: NonZeroU32,
    threads: i32,
}

impl LlamaEngine {
    /// Loads the model at `config.path`. Blocks for as long as llama.cpp takes
    /// to map the weights.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        if !path.is_file() {
            return Err(Error::ModelNotFound {
                path: config.path.clone(),
            });
        }

        let context_size = NonZeroU32::new(config.context_size)
            .ok_or_else(|| Error::config("model.context_size must be positive"))?;
        let threads = i32::try_from(config.threads)
            .map_err(|_| Error::config("model.threads is out of range"))?;

        send_logs_to_tracing(LogOptions::default());

        let backend = LlamaBackend::init()
            .map_err(|e| Error::model_load(format!("Failed to init llama backend: {e}")))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);

        let started = Instant::now();
        let model = LlamaModel::load_from_file(&backend, path, &model_params)
            .map_err(|e| Error::model_load(format!("Failed to load {}: {e}", config.path)))?;

        info!(
            "Loaded model {} in {:.1}s (context {}, {} threads)",
            config.path,
            started.elapsed().as_secs_f32(),
            context_size,
            threads
        );

        Ok(Self {
            backend,
            model,
            context_size,
            threads,
        })
    }

    fn seed(params: &GenerationParams) -> u32 {
        params.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or(42)
        })
    }
}

impl TextGenerator for LlamaEngine {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(Some(self.context_size))
            .with_n_batch(self.context_size.get())
            .with_n_threads(self.threads)
            .with_n_threads_batch(self.threads);

        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| Error::inference(format!("Failed to create context: {e}")))?;

        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| Error::inference(format!("Failed to tokenize prompt: {e}")))?;

        let n_ctx = ctx.n_ctx() as usize;
        if tokens.is_empty() || tokens.len() >= n_ctx {
            return Err(Error::inference(format!(
                "Prompt is {} tokens, context window is {}",
                tokens.len(),
                n_ctx
            )));
        }

        let mut batch = LlamaBatch::new(n_ctx, 1);
        let last = tokens.len() - 1;
        for (i, token) in tokens.iter().enumerate() {
            batch
                .add(*token, i as i32, &[0], i == last)
                .map_err(|e| Error::inference(format!("Failed to add token to batch: {e}")))?;
        }

        ctx.decode(&mut batch)
            .map_err(|e| Error::inference(format!("Failed to decode prompt: {e}")))?;

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::penalties(PENALTY_LAST_N, params.repeat_penalty, 0.0, 0.0),
            LlamaSampler::top_k(params.top_k),
            LlamaSampler::top_p(params.top_p, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(Self::seed(params)),
        ]);

        let started = Instant::now();
        let mut completion = Completion::new(&params.stop);
        let mut n_cur = tokens.len();
        let mut generated: u32 = 0;

        while generated < params.max_tokens && n_cur < n_ctx {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }

            let bytes = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| Error::inference(format!("Failed to detokenize: {e}")))?;
            generated += 1;

            if completion.push(&bytes) {
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur as i32, &[0], true)
                .map_err(|e| Error::inference(format!("Failed to add token: {e}")))?;
            n_cur += 1;

            ctx.decode(&mut batch)
                .map_err(|e| Error::inference(format!("Failed to decode: {e}")))?;
        }

        debug!(
            "Generated {} tokens in {:.2}s (prompt {} tokens, stopped: {})",
            generated,
            started.elapsed().as_secs_f32(),
            tokens.len(),
            completion.is_stopped()
        );

        Ok(completion.finish())
    }
}
