//! Connections: mutual-follow relationships with a request/accept lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identified, UserSummary};

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Request sent, awaiting the other side
    Pending,
    /// Both sides agreed
    Accepted,
    /// Recipient declined
    Rejected,
    Blocked,
}

impl ConnectionStatus {
    /// Whether `next` is a legal transition from this state.
    ///
    /// Only pending requests can be answered; anything can be blocked.
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Rejected) | (_, Blocked)
        )
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Pending => write!(f, "pending"),
            ConnectionStatus::Accepted => write!(f, "accepted"),
            ConnectionStatus::Rejected => write!(f, "rejected"),
            ConnectionStatus::Blocked => write!(f, "blocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub requester: UserSummary,
    pub recipient: UserSummary,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// The user on the other side of the connection from `my_id`
    pub fn other_party(&self, my_id: &str) -> &UserSummary {
        if self.requester.id == my_id {
            &self.recipient
        } else {
            &self.requester
        }
    }

    /// Whether `my_id` is the one who has to answer this request
    pub fn awaits_response_from(&self, my_id: &str) -> bool {
        self.status == ConnectionStatus::Pending && self.recipient.id == my_id
    }
}

impl Identified for Connection {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(status: ConnectionStatus) -> Connection {
        Connection {
            id: "c1".into(),
            requester: UserSummary {
                id: "ana".into(),
                name: "Ana".into(),
                avatar: None,
            },
            recipient: UserSummary {
                id: "ben".into(),
                name: "Ben".into(),
                avatar: None,
            },
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_transitions() {
        use ConnectionStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Accepted.can_transition_to(Blocked));
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Accepted));
    }

    #[test]
    fn test_parties() {
        let c = connection(ConnectionStatus::Pending);
        assert_eq!(c.other_party("ana").id, "ben");
        assert_eq!(c.other_party("ben").id, "ana");
        assert!(c.awaits_response_from("ben"));
        assert!(!c.awaits_response_from("ana"));
        assert!(!connection(ConnectionStatus::Accepted).awaits_response_from("ben"));
    }
}
