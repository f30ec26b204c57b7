//! Authentication: token kinds, session events, and the request pipeline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Api façade (api module)                                        │
//! │  - typed operations per resource path                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  AuthenticatedClient (this module)                              │
//! │  - picks the bearer token for the request's TokenKind           │
//! │  - on 401: one refresh, one replay, or logout                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  HttpTransport (transport module)                               │
//! │  - reqwest in production, scripted doubles in tests             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod pipeline;

pub use pipeline::{AuthenticatedClient, REFRESH_PATH};

use serde::{Deserialize, Serialize};

/// Which credential a request is authorized with.
///
/// Each kind is persisted independently with its own lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Short-lived token for ordinary API calls
    Access,
    /// Long-lived token exchanged for a new access token
    Refresh,
    /// One-time token from the email verification link
    EmailVerification,
    /// One-time token from the password reset link
    ResetPassword,
}

impl TokenKind {
    pub const ALL: [TokenKind; 4] = [
        TokenKind::Access,
        TokenKind::Refresh,
        TokenKind::EmailVerification,
        TokenKind::ResetPassword,
    ];

    /// Storage key for this kind
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::Refresh => "refresh_token",
            TokenKind::EmailVerification => "verification_token",
            TokenKind::ResetPassword => "reset_password_token",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Access/refresh pair returned by login and by the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out
    UserRequested,
    /// A 401 arrived and no refresh token was stored
    MissingRefreshToken,
    /// The refresh endpoint failed or refused
    RefreshFailed(String),
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoutReason::UserRequested => write!(f, "user requested"),
            LogoutReason::MissingRefreshToken => write!(f, "no refresh token"),
            LogoutReason::RefreshFailed(msg) => write!(f, "refresh failed: {}", msg),
        }
    }
}

/// View the client sends the user to after logout
pub const LOGIN_ROUTE: &str = "/login";

/// Session lifecycle notifications published by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tokens were stored after login
    LoggedIn,
    /// The access token was renewed via the refresh endpoint
    TokensRefreshed,
    /// Credentials were cleared; the front end should navigate to `redirect_to`
    LoggedOut {
        reason: LogoutReason,
        redirect_to: &'static str,
    },
}
