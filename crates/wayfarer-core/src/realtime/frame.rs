//! Frame decoding
//!
//! Two encodings are accepted:
//! - Socket.IO event packets: `42["new-message",{...}]`, optionally with a
//!   namespace (`42/chat,[...]`) or an ack id (`4217[...]`)
//! - Plain JSON objects: `{"event":"new-message","data":{...}}`
//!
//! Engine.IO control packets (open, ping, pong, connect) decode to `None`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{MESSAGE_NOTIFICATION_PREFIX, NEW_CHAT, NEW_MESSAGE};
use crate::error::{ClientError, ClientResult};
use crate::types::{Chat, Message};

/// A push event the client understands
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    NewMessage(Message),
    NewChat(Chat),
    /// Message notification addressed to `user_id`
    MessageNotification { user_id: String, message: Message },
}

impl RealtimeEvent {
    pub fn name(&self) -> String {
        match self {
            RealtimeEvent::NewMessage(_) => NEW_MESSAGE.to_string(),
            RealtimeEvent::NewChat(_) => NEW_CHAT.to_string(),
            RealtimeEvent::MessageNotification { user_id, .. } => event_name(user_id),
        }
    }
}

/// Name of the notification event for one user
pub fn event_name(user_id: &str) -> String {
    format!("{}{}", MESSAGE_NOTIFICATION_PREFIX, user_id)
}

/// Decode one text frame.
///
/// `Ok(None)` for control packets and events this client does not handle;
/// `Err` when a frame claims to be an event but cannot be decoded.
pub fn parse_frame(frame: &str) -> ClientResult<Option<RealtimeEvent>> {
    let frame = frame.trim();
    if frame.is_empty() {
        return Ok(None);
    }

    let (name, payload) = if frame.starts_with('{') {
        let value: Value = serde_json::from_str(frame).map_err(malformed)?;
        let name = value
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Realtime("frame has no event name".into()))?
            .to_string();
        let payload = value.get("data").cloned().unwrap_or(Value::Null);
        (name, payload)
    } else if let Some(packet) = frame.strip_prefix("42") {
        match split_socketio_event(packet)? {
            Some(parts) => parts,
            None => return Ok(None),
        }
    } else {
        // Other Engine.IO/Socket.IO packet types carry no events
        return Ok(None);
    };

    decode_event(&name, payload)
}

fn split_socketio_event(packet: &str) -> ClientResult<Option<(String, Value)>> {
    let mut body = packet;
    if body.starts_with('/') {
        body = body
            .split_once(',')
            .map(|(_, rest)| rest)
            .ok_or_else(|| ClientError::Realtime("namespace without payload".into()))?;
    }
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());

    let array: Vec<Value> = serde_json::from_str(body).map_err(malformed)?;
    let mut items = array.into_iter();
    let Some(Value::String(name)) = items.next() else {
        return Ok(None);
    };
    Ok(Some((name, items.next().unwrap_or(Value::Null))))
}

fn decode_event(name: &str, payload: Value) -> ClientResult<Option<RealtimeEvent>> {
    let event = if name == NEW_MESSAGE {
        RealtimeEvent::NewMessage(decode_payload(payload)?)
    } else if name == NEW_CHAT {
        RealtimeEvent::NewChat(decode_payload(payload)?)
    } else if let Some(user_id) = name.strip_prefix(MESSAGE_NOTIFICATION_PREFIX) {
        if user_id.is_empty() {
            return Err(ClientError::Realtime("notification event without user id".into()));
        }
        RealtimeEvent::MessageNotification {
            user_id: user_id.to_string(),
            message: decode_payload(payload)?,
        }
    } else {
        return Ok(None);
    };
    Ok(Some(event))
}

/// Accept the bare record or the REST envelope around it
fn decode_payload<T: DeserializeOwned>(payload: Value) -> ClientResult<T> {
    let record = match payload {
        Value::Object(mut map) => {
            if let Some(Value::Object(mut data)) = map.remove("data") {
                data.remove("attributes").unwrap_or(Value::Object(data))
            } else if let Some(attributes) = map.remove("attributes") {
                attributes
            } else {
                Value::Object(map)
            }
        }
        other => other,
    };
    serde_json::from_value(record).map_err(malformed)
}

fn malformed(e: serde_json::Error) -> ClientError {
    ClientError::Realtime(format!("malformed frame: {}", e))
}
