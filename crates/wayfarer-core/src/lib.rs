//! Wayfarer client core
//!
//! Client side of the Wayfarer travel social network: typed access to the
//! REST backend, token handling with refresh-and-replay, the journey image
//! compositor, list pagination, an optimistic query cache, and the
//! real-time inbox.
//!
//! # Quick Start
//!
//! ```no_run
//! use wayfarer_core::{Api, ClientConfig, ReqwestTransport, Storage};
//!
//! # async fn example() -> wayfarer_core::ClientResult<()> {
//! let config = ClientConfig::new("https://api.example.com/api/v1", "/tmp/wayfarer")?;
//! let transport = ReqwestTransport::new(&config)?;
//! let store = Storage::new(config.database_path())?;
//! let api = Api::new(transport, store, &config);
//!
//! api.login("ana@example.com", "correct horse battery").await?;
//! let feed = api.feed(1).await?;
//! println!("{} posts", feed.items.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod compositor;
pub mod config;
pub mod error;
pub mod feedback;
pub mod journey;
pub mod pagination;
pub mod places;
pub mod realtime;
pub mod scope;
pub mod storage;
pub mod transport;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::Api;
pub use auth::{AuthenticatedClient, LogoutReason, SessionEvent, TokenKind, TokenPair};
pub use cache::{OptimisticTicket, QueryCache, Subscription};
pub use compositor::{CompositeOutput, Compositor, FontSpec, TextOverlay, Transform};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use feedback::Toast;
pub use journey::JourneyDraft;
pub use pagination::PagedList;
pub use places::{HttpPlacesProvider, Place, PlacesProvider};
pub use realtime::{Inbox, RealtimeEvent};
pub use scope::ViewScope;
pub use storage::{CredentialStore, MemoryStore, Storage};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, UploadPayload};
pub use types::{Identified, Page};
pub use validation::ValidationErrors;
