//! Typed operations over the backend's resource paths
//!
//! Every operation goes through [`AuthenticatedClient::send`], so token
//! selection and refresh-and-replay apply uniformly. HTTP error statuses
//! become `ClientError::Api`; a 401 that survived recovery becomes
//! `ClientError::Unauthorized` (the session is already gone by then).

mod auth;
mod connections;
mod events;
mod groups;
mod messages;
mod notifications;
mod posts;
mod stories;
mod search;
mod users;

pub use auth::{AuthSession, Registration};
pub use posts::Attachment;
pub use search::{SearchResults, SearchScope};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::auth::{AuthenticatedClient, SessionEvent};
use crate::compositor::Compositor;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::storage::CredentialStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::types::{decode_envelope, Page};

/// Items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Client for the Wayfarer REST API
pub struct Api<T, S> {
    client: AuthenticatedClient<T, S>,
    compositor: Compositor,
    one_time_ttl: Duration,
    page_size: u32,
}

impl<T: HttpTransport, S: CredentialStore> Api<T, S> {
    pub fn new(transport: T, store: S, config: &ClientConfig) -> Self {
        Self {
            client: AuthenticatedClient::new(transport, store, config),
            compositor: Compositor::new(),
            one_time_ttl: config.one_time_token_ttl,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn client(&self) -> &AuthenticatedClient<T, S> {
        &self.client
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Session lifecycle events, including forced logout
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.client.subscribe()
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let response = self.client.send(&request).await?;
        response.error_for_status().map_err(|e| match e {
            ClientError::Api { status: 401, message } => {
                ClientError::Unauthorized(message.unwrap_or_else(|| "session expired".into()))
            }
            other => other,
        })
    }

    /// Send and decode `data.attributes`
    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<R> {
        let response = self.send(request).await?;
        decode_envelope::<R>(&response.body)?.into_attributes()
    }

    /// Send and return only the server's message
    async fn call_ack(&self, request: ApiRequest) -> ClientResult<Option<String>> {
        self.send(request).await?.ack()
    }

    /// Send a list request for 1-based `page`
    async fn call_page<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
        page: u32,
    ) -> ClientResult<Page<R>> {
        let page = page.max(1);
        let request = request.query("page", page).query("limit", self.page_size);
        let response = self.send(request).await?;
        Page::from_envelope(decode_envelope(&response.body)?, page, self.page_size)
    }
}
