//! Authenticated request pipeline
//!
//! Every request goes out with the token of its category. A 401 on an
//! access-token request gets exactly one recovery attempt:
//!
//! ```text
//! send ──► 401? ──no──► return response
//!            │
//!            yes ──► refresh token stored? ──no──► logout, return original 401
//!                         │
//!                         yes ──► POST auth/refresh-token ──fail──► logout, return original 401
//!                                      │
//!                                      200 ──► persist pair ──► replay once ──► return replay result
//! ```
//!
//! A 401 on the replay is returned as-is. There is no loop and no backoff.

use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::{LogoutReason, SessionEvent, TokenKind, TokenPair, LOGIN_ROUTE};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::storage::CredentialStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "auth/refresh-token";

/// Capacity for the session event broadcast channel
const SESSION_CHANNEL_CAPACITY: usize = 16;

/// HTTP client wrapper that attaches bearer tokens and recovers from
/// expired access tokens once per request.
pub struct AuthenticatedClient<T, S> {
    transport: T,
    store: S,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Serializes refreshes so concurrent 401s share one token rotation
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl<T: HttpTransport, S: CredentialStore> AuthenticatedClient<T, S> {
    pub fn new(transport: T, store: S, config: &ClientConfig) -> Self {
        Self::with_lifetimes(transport, store, config.access_token_ttl, config.refresh_token_ttl)
    }

    pub fn with_lifetimes(
        transport: T,
        store: S,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self {
            transport,
            store,
            access_ttl,
            refresh_ttl,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receive session lifecycle events (login, refresh, logout)
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether an access or refresh token is currently stored
    pub fn has_session(&self) -> ClientResult<bool> {
        Ok(self.store.token(TokenKind::Access)?.is_some()
            || self.store.token(TokenKind::Refresh)?.is_some())
    }

    /// Persist tokens from a successful login
    pub fn begin_session(&self, pair: &TokenPair) -> ClientResult<()> {
        self.store.save_pair(pair, self.access_ttl, self.refresh_ttl)?;
        info!("Session started");
        let _ = self.events.send(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Global logout: clear credentials and tell the front end to go to the login view.
    ///
    /// The event is sent even when clearing fails; the store error is returned after.
    pub fn logout(&self, reason: LogoutReason) -> ClientResult<()> {
        info!(%reason, "Logging out");
        let cleared = self.store.clear_credentials();
        let _ = self.events.send(SessionEvent::LoggedOut {
            reason,
            redirect_to: LOGIN_ROUTE,
        });
        cleared
    }

    /// Send a request through the pipeline.
    ///
    /// HTTP error statuses come back as `Ok(response)`; only transport
    /// failures are `Err`. After an unrecoverable 401 the original response
    /// is returned and the logout side effect has already run.
    pub async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let bearer = match request.auth {
            Some(kind) => self.store.token(kind)?,
            None => None,
        };

        let response = self.transport.execute(request, bearer.as_deref()).await?;
        if !response.is_unauthorized() || request.auth != Some(TokenKind::Access) {
            return Ok(response);
        }

        debug!(path = %request.path, "Access token rejected, attempting refresh");
        match self.recover(bearer.as_deref()).await {
            Ok(fresh) => {
                debug!(path = %request.path, "Replaying request with renewed token");
                self.transport.execute(request, Some(&fresh)).await
            }
            Err(reason) => {
                warn!(path = %request.path, %reason, "Token recovery failed");
                if let Err(error) = self.logout(reason) {
                    warn!(%error, "Could not clear stored credentials");
                }
                Ok(response)
            }
        }
    }

    /// Obtain a usable access token after a 401, refreshing at most once.
    async fn recover(&self, rejected: Option<&str>) -> Result<String, LogoutReason> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have rotated the token while this one waited.
        let current = self
            .store
            .token(TokenKind::Access)
            .map_err(|e| LogoutReason::RefreshFailed(e.to_string()))?;
        if let Some(current) = current {
            if Some(current.as_str()) != rejected {
                debug!("Access token already rotated, skipping refresh");
                return Ok(current);
            }
        }

        let refresh_token = self
            .store
            .token(TokenKind::Refresh)
            .map_err(|e| LogoutReason::RefreshFailed(e.to_string()))?
            .ok_or(LogoutReason::MissingRefreshToken)?;

        let request = ApiRequest::post(REFRESH_PATH).with_token(TokenKind::Refresh);
        let response = self
            .transport
            .execute(&request, Some(&refresh_token))
            .await
            .map_err(|e| LogoutReason::RefreshFailed(e.to_string()))?;
        if response.status != 200 {
            return Err(LogoutReason::RefreshFailed(format!(
                "refresh endpoint answered {}",
                response.status
            )));
        }

        let pair: TokenPair = response
            .attributes()
            .map_err(|e| LogoutReason::RefreshFailed(e.to_string()))?;
        self.store
            .save_pair(&pair, self.access_ttl, self.refresh_ttl)
            .map_err(|e| LogoutReason::RefreshFailed(e.to_string()))?;

        info!("Access token refreshed");
        let _ = self.events.send(SessionEvent::TokensRefreshed);
        Ok(pair.access_token)
    }
}
