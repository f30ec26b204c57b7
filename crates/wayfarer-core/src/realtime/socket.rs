//! Socket.IO client over a WebSocket
//!
//! Speaks the Engine.IO v4 subset a listener needs: the open/connect
//! handshake with the access token as auth payload, `2`/`3` heartbeats,
//! and event packets, which are yielded as text frames for
//! [`parse_frame`](super::parse_frame).
//!
//! ```text
//! server: 0{"sid":..,"pingInterval":..}   client: 40{"token":..}
//! server: 40{"sid":..}                    (connected)
//! server: 2                               client: 3
//! server: 42["new-message",{..}]          ──► frame stream
//! ```

use std::pin::Pin;
use std::time::Duration;

use futures::{stream, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event frames of a connected socket. Ends on disconnect or a missed heartbeat.
pub type SocketFrames = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Heartbeat timing used when the open packet does not carry one
const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

/// Engine.IO / Socket.IO packet kinds the client reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Packet {
    Open,
    Close,
    Ping,
    Connected,
    Disconnected,
    Event,
    ConnectError(String),
    Other,
}

fn classify(text: &str) -> Packet {
    match text.as_bytes() {
        [b'0', ..] => Packet::Open,
        [b'1', ..] => Packet::Close,
        [b'2', ..] => Packet::Ping,
        [b'4', b'0', ..] => Packet::Connected,
        [b'4', b'1', ..] => Packet::Disconnected,
        [b'4', b'2', ..] => Packet::Event,
        [b'4', b'4', ..] => Packet::ConnectError(connect_error_reason(&text[2..])),
        _ => Packet::Other,
    }
}

fn connect_error_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenPacket {
    ping_interval: Option<u64>,
    ping_timeout: Option<u64>,
}

impl OpenPacket {
    /// How long to wait for the next server packet before giving up
    fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(
            self.ping_interval.unwrap_or(DEFAULT_PING_INTERVAL_MS)
                + self.ping_timeout.unwrap_or(DEFAULT_PING_TIMEOUT_MS),
        )
    }
}

/// WebSocket transport URL for a Socket.IO endpoint
pub fn socket_url(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    url
}

/// Connect to the configured realtime endpoint
pub async fn connect(config: &ClientConfig, token: Option<&str>) -> ClientResult<SocketFrames> {
    connect_to(&config.realtime_endpoint()?, token).await
}

/// Open the socket and complete the Socket.IO handshake.
///
/// # Errors
///
/// `ClientError::Realtime` when the connection fails or the server refuses
/// the connect packet (for instance a rejected token).
pub async fn connect_to(endpoint: &Url, token: Option<&str>) -> ClientResult<SocketFrames> {
    let url = socket_url(endpoint);
    info!(%endpoint, "Connecting realtime socket");
    let (mut socket, _) = connect_async(url.as_str()).await.map_err(socket_error)?;

    let deadline = handshake(&mut socket, token).await?;
    info!("Realtime socket connected");
    Ok(Box::pin(event_frames(socket, deadline)))
}

async fn handshake(socket: &mut Socket, token: Option<&str>) -> ClientResult<Duration> {
    let mut deadline = Duration::from_millis(DEFAULT_PING_INTERVAL_MS + DEFAULT_PING_TIMEOUT_MS);
    loop {
        let Some(text) = next_text(socket).await? else {
            return Err(ClientError::Realtime("socket closed during handshake".into()));
        };
        match classify(&text) {
            Packet::Open => {
                if let Ok(open) = serde_json::from_str::<OpenPacket>(&text[1..]) {
                    deadline = open.heartbeat_deadline();
                }
                debug!(deadline_ms = deadline.as_millis() as u64, "Engine opened, joining namespace");
                let connect = match token {
                    Some(token) => format!("40{}", json!({ "token": token })),
                    None => "40".to_string(),
                };
                send_text(socket, connect).await?;
            }
            Packet::Ping => send_text(socket, "3".to_string()).await?,
            Packet::Connected => return Ok(deadline),
            Packet::ConnectError(reason) => {
                return Err(ClientError::Realtime(format!("connection refused: {}", reason)));
            }
            Packet::Close | Packet::Disconnected => {
                return Err(ClientError::Realtime("server closed the session".into()));
            }
            Packet::Event | Packet::Other => trace!(packet = %text, "Skipping packet before connect"),
        }
    }
}

fn event_frames(socket: Socket, deadline: Duration) -> impl Stream<Item = String> + Send {
    stream::unfold(socket, move |mut socket| async move {
        loop {
            let text = match tokio::time::timeout(deadline, next_text(&mut socket)).await {
                Ok(Ok(Some(text))) => text,
                Ok(Ok(None)) => {
                    debug!("Realtime socket closed");
                    return None;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Realtime socket failed");
                    return None;
                }
                Err(_) => {
                    warn!(deadline_ms = deadline.as_millis() as u64, "Realtime heartbeat missed");
                    return None;
                }
            };
            match classify(&text) {
                Packet::Event => return Some((text, socket)),
                Packet::Ping => {
                    if let Err(e) = send_text(&mut socket, "3".to_string()).await {
                        warn!(error = %e, "Could not answer heartbeat");
                        return None;
                    }
                }
                Packet::Close | Packet::Disconnected => {
                    info!("Server ended the realtime session");
                    return None;
                }
                _ => trace!(packet = %text, "Ignoring control packet"),
            }
        }
    })
}

/// Next text message. `None` once the socket is closed.
async fn next_text(socket: &mut Socket) -> ClientResult<Option<String>> {
    while let Some(message) = socket.next().await {
        match message.map_err(socket_error)? {
            Message::Text(text) => return Ok(Some(text)),
            Message::Close(frame) => {
                debug!(?frame, "Close frame received");
                return Ok(None);
            }
            // WebSocket-level ping/pong is answered by tungstenite
            _ => {}
        }
    }
    Ok(None)
}

async fn send_text(socket: &mut Socket, text: String) -> ClientResult<()> {
    trace!(packet = %text, "Sending packet");
    socket.send(Message::Text(text)).await.map_err(socket_error)
}

fn socket_error(e: tokio_tungstenite::tungstenite::Error) -> ClientError {
    ClientError::Realtime(e.to_string())
}
