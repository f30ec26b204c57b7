//! Feed posts and comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, UserSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: UserSummary,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Flip the like flag and adjust the counter, as an optimistic update would.
    pub fn toggle_like(&mut self) {
        if self.liked_by_me {
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.like_count += 1;
        }
        self.liked_by_me = !self.liked_by_me;
    }
}

impl Identified for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Identified for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}
