use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One exchange as persisted to the chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub timestamp: DateTime<Local>,
    pub system_prompt: String,
    pub user_prompt: String,
    pub response: String,
}

impl ChatLogEntry {
    pub fn new(system_prompt: String, user_prompt: String, response: String) -> Self {
        Self {
            timestamp: Local::now(),
            system_prompt,
            user_prompt,
            response,
        }
    }
}
