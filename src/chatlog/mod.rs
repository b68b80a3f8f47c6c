//! Append-only JSONL audit log of chat exchanges.

mod storage;
mod types;

pub use storage::ChatLog;
pub use types::ChatLogEntry;
