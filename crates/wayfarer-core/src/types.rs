//! Core types for the Wayfarer client
//!
//! DTOs mirror what the backend returns. They carry no client-side
//! invariants beyond matching that shape.

pub mod chat;
pub mod connection;
pub mod event;
pub mod group;
pub mod journey;
pub mod notification;
pub mod post;
pub mod user;

pub use chat::{Chat, Message};
pub use connection::{Connection, ConnectionStatus};
pub use event::Event;
pub use group::Group;
pub use journey::{Journey, JourneyKind};
pub use notification::{Notification, NotificationKind};
pub use post::{Comment, Post};
pub use user::{PrivacySettings, ProfileUpdate, User, UserSummary, Visibility};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Anything with a backend-assigned string identifier.
///
/// Pagination merges and the query cache key on this.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Backend response envelope: `{ code, message, data: { attributes, meta } }`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<EnvelopeData<T>>,
}

/// Payload part of an [`Envelope`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvelopeData<T> {
    pub attributes: T,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Pagination metadata attached to list responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Envelope<T> {
    /// Take the attributes, failing when the server sent no data.
    pub fn into_attributes(self) -> ClientResult<T> {
        self.data.map(|d| d.attributes).ok_or_else(|| {
            ClientError::UnexpectedResponse(
                self.message
                    .unwrap_or_else(|| "response carried no data".to_string()),
            )
        })
    }
}

/// Message-only envelope, for endpoints whose data is irrelevant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number this page was fetched as
    pub page: u32,
    /// Whether the server reports more pages after this one
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, has_more: bool) -> Self {
        Self {
            items,
            page,
            has_more,
        }
    }

    /// Build a page from an envelope list response.
    ///
    /// Without `meta`, a short page (fewer than `limit` items) is the last one.
    pub fn from_envelope(envelope: Envelope<Vec<T>>, page: u32, limit: u32) -> ClientResult<Self> {
        let data = envelope.data.ok_or_else(|| {
            ClientError::UnexpectedResponse("list response carried no data".into())
        })?;
        let has_more = match data.meta {
            Some(meta) => meta.current_page < meta.total_pages,
            None => data.attributes.len() as u32 >= limit && limit > 0,
        };
        let page = data.meta.map(|m| m.current_page).unwrap_or(page);
        Ok(Self::new(data.attributes, page, has_more))
    }
}

/// Decode an envelope from a JSON body
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> ClientResult<Envelope<T>> {
    serde_json::from_slice(body).map_err(|e| {
        ClientError::UnexpectedResponse(format!("malformed response envelope: {}", e))
    })
}
