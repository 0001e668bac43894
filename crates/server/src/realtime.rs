use std::convert::Infallible;

use axum::response::sse::Event;
use futures_util::stream::{self, Stream};
use shared_types::ChatEvent;
use tokio::sync::broadcast::{self, error::RecvError};

const HUB_CAPACITY: usize = 256;

/// In-process fan-out of chat events to live subscribers.
///
/// Delivery is best effort: a subscriber that falls more than
/// `HUB_CAPACITY` events behind skips the missed ones.
#[derive(Clone)]
pub struct ChatHub {
    tx: broadcast::Sender<ChatEvent>,
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: ChatEvent) -> usize {
        // Err only means nobody is listening.
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Open chat streams across all chats.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Next event for `chat_id`, skipping other chats and lag gaps.
/// `None` once the hub is gone.
async fn next_for_chat(rx: &mut broadcast::Receiver<ChatEvent>, chat_id: &str) -> Option<ChatEvent> {
    loop {
        match rx.recv().await {
            Ok(event) if event.chat_id() == chat_id => return Some(event),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(chat_id, skipped, "chat stream lagged, skipping events");
                continue;
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// SSE stream of events for one chat.
pub fn chat_event_stream(
    rx: broadcast::Receiver<ChatEvent>,
    chat_id: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((rx, chat_id), |(mut rx, chat_id)| async move {
        let event = next_for_chat(&mut rx, &chat_id).await?;
        let sse = Event::default()
            .event(event.name())
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().event(event.name()));
        Some((Ok(sse), (rx, chat_id)))
    })
}
