//! Interest groups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, Visibility};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for Group {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of `POST groups`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
}
