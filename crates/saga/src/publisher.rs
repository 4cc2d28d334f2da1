//! Best-effort event publication.

use kv_store::KvBackend;

use crate::events::DocumentEvent;

/// Publishes saga events on a pub/sub channel.
///
/// Delivery is fire-and-forget: a transport failure is logged and reported
/// as zero recipients, never as an error. Zero recipients only means no one
/// was listening.
#[derive(Clone)]
pub struct EventPublisher<B> {
    backend: B,
}

impl<B: KvBackend> EventPublisher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub async fn publish(&self, channel: &str, event: &DocumentEvent) -> u32 {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(channel, error = %err, "failed to serialize event");
                return 0;
            }
        };

        match self.backend.publish(channel, &payload).await {
            Ok(recipients) => {
                tracing::debug!(
                    channel,
                    recipients,
                    event_type = %event.event_type,
                    "event published"
                );
                recipients
            }
            Err(err) => {
                tracing::warn!(channel, error = %err, "event publish failed");
                0
            }
        }
    }
}
