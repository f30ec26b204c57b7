//! Chats and direct messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, UserSummary};

/// A single direct message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender.id == user_id
    }

    /// Message body truncated to `max_chars` characters for list previews
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.chars().count() > max_chars {
            let mut excerpt: String = self.content.chars().take(max_chars).collect();
            excerpt.push_str("...");
            excerpt
        } else {
            self.content.clone()
        }
    }
}

impl Identified for Message {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A conversation between participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub participants: Vec<UserSummary>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    /// Participants other than `my_id`, joined for a chat title
    pub fn title_for(&self, my_id: &str) -> String {
        let names: Vec<&str> = self
            .participants
            .iter()
            .filter(|p| p.id != my_id)
            .map(|p| p.name.as_str())
            .collect();
        if names.is_empty() {
            "Just you".to_string()
        } else {
            names.join(", ")
        }
    }
}

impl Identified for Chat {
    fn id(&self) -> &str {
        &self.id
    }
}
