//! Real-time push channel
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌─────────┐    ┌────────────────────┐
//! │ frame stream │──► │ parse_frame │──► │  Inbox  │──► │ broadcast<Update>  │
//! │ (text)       │    │ RealtimeEv. │    │ (merge) │    │ (views subscribe)  │
//! └──────────────┘    └─────────────┘    └─────────┘    └────────────────────┘
//! ```
//!
//! [`connect`] opens the Socket.IO connection to the backend and yields its
//! event frames. Any other text frame stream (a test vector, stdin) can feed
//! the pump the same way.

mod frame;
mod inbox;
mod pump;
mod socket;

pub use frame::{event_name, parse_frame, RealtimeEvent};
pub use inbox::{Inbox, InboxUpdate};
pub use pump::{PumpStats, RealtimeChannel};
pub use socket::{connect, connect_to, socket_url, SocketFrames};

/// Event name for a message posted to a chat the user is in
pub const NEW_MESSAGE: &str = "new-message";
/// Event name for a chat created with the user as participant
pub const NEW_CHAT: &str = "new-chat";
/// Prefix of the per-user message notification event
pub const MESSAGE_NOTIFICATION_PREFIX: &str = "message-notification::";
