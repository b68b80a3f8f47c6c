//! Local text generation.
//!
//! `LlamaEngine` drives llama.cpp directly and is blocking; `Inference` is the
//! async front the HTTP layer talks to, and it allows one generation at a
//! time.

mod client;
mod completion;
mod llama;
mod types;

pub use client::{Inference, TextGenerator};
pub use completion::Completion;
pub use llama::LlamaEngine;
pub use types::{GenerationParams, compose_prompt};

#[cfg(test)]
pub use client::MockTextGenerator;
