//! Journeys (ephemeral stories)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, UserSummary};

/// What a journey displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyKind {
    Image,
    Video,
    Text,
}

impl JourneyKind {
    /// Value of the `type` field in upload payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            JourneyKind::Image => "image",
            JourneyKind::Video => "video",
            JourneyKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub author: UserSummary,
    #[serde(rename = "type")]
    pub kind: JourneyKind,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Journey {
    /// Journeys past their expiry drop out of the feed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl Identified for Journey {
    fn id(&self) -> &str {
        &self.id
    }
}
