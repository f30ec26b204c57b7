//! Frame pump: reads frames until cancelled and publishes inbox updates

use std::sync::Arc;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{parse_frame, Inbox, InboxUpdate};

/// Capacity of the update broadcast channel
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Counters reported when a pump stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub frames: u64,
    pub applied: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Shared inbox plus the channel views listen on
#[derive(Clone)]
pub struct RealtimeChannel {
    inbox: Arc<Mutex<Inbox>>,
    updates: broadcast::Sender<InboxUpdate>,
    cancel: CancellationToken,
}

impl RealtimeChannel {
    pub fn new(inbox: Inbox) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inbox: Arc::new(Mutex::new(inbox)),
            updates,
            cancel: CancellationToken::new(),
        }
    }

    pub fn inbox(&self) -> Arc<Mutex<Inbox>> {
        self.inbox.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboxUpdate> {
        self.updates.subscribe()
    }

    /// Token that stops every pump started from this channel
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn shutdown(&self) {
        info!("Stopping realtime pump");
        self.cancel.cancel();
    }

    /// Run the pump on a background task
    pub fn spawn<S>(&self, frames: S) -> JoinHandle<PumpStats>
    where
        S: Stream<Item = String> + Send + Unpin + 'static,
    {
        let channel = self.clone();
        tokio::spawn(async move { channel.run(frames).await })
    }

    /// Read frames until the stream ends or the channel is cancelled
    pub async fn run<S>(&self, mut frames: S) -> PumpStats
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut stats = PumpStats::default();
        debug!("Realtime pump started");

        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                frame = frames.next() => frame,
            };
            let Some(frame) = frame else {
                debug!("Frame stream ended");
                break;
            };
            stats.frames += 1;

            let event = match parse_frame(&frame) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    stats.ignored += 1;
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "Dropping realtime frame");
                    stats.malformed += 1;
                    continue;
                }
            };

            let update = self.inbox.lock().apply(event);
            match update {
                Some(update) => {
                    stats.applied += 1;
                    let _ = self.updates.send(update);
                }
                None => stats.ignored += 1,
            }
        }

        debug!(?stats, "Realtime pump stopped");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::sync::mpsc;

    fn receiver_stream(rx: mpsc::Receiver<String>) -> impl Stream<Item = String> + Send + Unpin {
        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        }))
    }

    fn frame(id: &str, chat: &str, event: &str) -> String {
        format!(
            r#"42["{}",{{"id":"{}","chatId":"{}","sender":{{"id":"bo"}},"content":"hey","createdAt":"2024-05-01T10:00:00Z"}}]"#,
            event, id, chat
        )
    }

    #[tokio::test]
    async fn test_pump_merges_and_publishes() {
        let channel = RealtimeChannel::new(Inbox::new("me"));
        let mut updates = channel.subscribe();

        let frames = stream::iter(vec![
            "2".to_string(),
            frame("m1", "c1", "new-message"),
            frame("m1", "c1", "message-notification::me"),
            frame("m2", "c1", "message-notification::other"),
            "42[broken".to_string(),
        ]);
        let stats = channel.run(frames).await;

        assert_eq!(
            stats,
            PumpStats {
                frames: 5,
                applied: 1,
                ignored: 3,
                malformed: 1
            }
        );
        assert_eq!(
            updates.recv().await.unwrap(),
            InboxUpdate::MessageAdded {
                chat_id: "c1".into(),
                message_id: "m1".into()
            }
        );
        assert_eq!(channel.inbox().lock().unread_total(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_pump() {
        let channel = RealtimeChannel::new(Inbox::new("me"));
        let (tx, rx) = mpsc::channel(4);
        let handle = channel.spawn(receiver_stream(rx));

        tx.send(frame("m1", "c1", "new-message")).await.unwrap();
        // Wait until the first frame has been merged
        while channel.inbox().lock().messages("c1").is_empty() {
            tokio::task::yield_now().await;
        }
        let mut updates = channel.subscribe();

        channel.shutdown();
        let stats = handle.await.unwrap();
        assert_eq!(stats.applied, 1);
        assert!(channel.cancel_token().is_cancelled());

        // Frames after cancellation are never read
        let _ = tx.send(frame("m2", "c1", "new-message")).await;
        assert!(updates.try_recv().is_err());
        assert_eq!(channel.inbox().lock().messages("c1").len(), 1);
    }
}
