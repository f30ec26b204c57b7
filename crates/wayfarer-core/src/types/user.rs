//! User profile types

use serde::{Deserialize, Serialize};

use super::Identified;

/// Who may see a profile or send messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
    Private,
}

/// Privacy switches attached to a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    #[serde(default)]
    pub profile_visibility: Visibility,
    #[serde(default)]
    pub show_location: bool,
    #[serde(default)]
    pub allow_messages_from: Visibility,
}

/// Full user record as returned by `users/me` and `users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub privacy: Option<PrivacySettings>,
}

impl User {
    /// "First Last", falling back to the username, then the email.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.email.clone())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.display_name(),
            avatar: self.avatar.clone(),
        }
    }
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Compact owner reference embedded in posts, journeys, chats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Identified for UserSummary {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial profile update; unset fields are left alone server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.location.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, username: Option<&str>) -> User {
        User {
            id: "u1".into(),
            first_name: first.into(),
            last_name: last.into(),
            email: "ana@example.com".into(),
            username: username.map(String::from),
            avatar: None,
            cover_photo: None,
            bio: None,
            location: None,
            is_verified: false,
            privacy: None,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(user("Ana", "Lima", None).display_name(), "Ana Lima");
        assert_eq!(user("Ana", "", None).display_name(), "Ana");
        assert_eq!(user("", "", Some("wanderer")).display_name(), "wanderer");
        assert_eq!(user("", "", None).display_name(), "ana@example.com");
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("Slow travel".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "bio": "Slow travel" }));
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_privacy_roundtrip_wire_names() {
        let settings = PrivacySettings {
            profile_visibility: Visibility::Connections,
            show_location: true,
            allow_messages_from: Visibility::Private,
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["profileVisibility"], "connections");
        assert_eq!(json["allowMessagesFrom"], "private");
    }
}
