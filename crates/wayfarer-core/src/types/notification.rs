//! Notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    ConnectionRequest,
    ConnectionAccepted,
    Message,
    EventInvite,
    GroupInvite,
    /// Anything this client does not know about yet
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub actor: Option<UserSummary>,
    #[serde(default)]
    pub message: String,
    /// Id of the post/chat/event the notification points at
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Identified for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_maps_to_other() {
        let n: Notification = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "type": "badge_earned",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Other);
        assert!(!n.is_read);
    }
}
