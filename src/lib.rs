pub mod chatlog;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod server;

pub use error::{Error, Result};
