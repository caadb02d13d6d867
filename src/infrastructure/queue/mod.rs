//! Queue seams: the outbound transcode-request publisher and the inbound
//! completion-event source, with per-message acknowledgement.

use async_trait::async_trait;
use thiserror::Error;

use crate::common::timeout::TimedOut;
use crate::modules::content::events::TranscodeRequest;

#[cfg(test)]
pub mod memory;
pub mod rabbitmq;
pub mod sqs;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(String),
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The consumer stream ended. The source resubscribes on the next receive.
    #[error("queue consumer closed")]
    Closed,
    #[error("queue call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<TimedOut> for QueueError {
    fn from(t: TimedOut) -> Self {
        QueueError::Timeout(t.0)
    }
}

#[async_trait]
pub trait TranscodePublisher: Send + Sync {
    async fn publish(&self, request: &TranscodeRequest) -> Result<(), QueueError>;
}

#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Waits for the next batch of completion messages. An empty batch is a
    /// normal outcome of a long poll.
    async fn receive(&self) -> Result<Vec<Delivery>, QueueError>;
}

/// Settles one received message with the transport it came from.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), QueueError>;
    async fn reject(&self, requeue: bool) -> Result<(), QueueError>;
}

/// A received message. Dropping it without calling [`Delivery::ack`] leaves it
/// for the transport to redeliver.
pub struct Delivery {
    pub message_id: String,
    pub body: Vec<u8>,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(message_id: impl Into<String>, body: Vec<u8>, acker: Box<dyn Acker>) -> Self {
        Self {
            message_id: message_id.into(),
            body,
            acker,
        }
    }

    pub async fn ack(self) -> Result<(), QueueError> {
        self.acker.ack().await
    }

    /// `requeue = false` hands the message to dead-lettering where the transport supports it.
    pub async fn reject(self, requeue: bool) -> Result<(), QueueError> {
        self.acker.reject(requeue).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("message_id", &self.message_id)
            .field("len", &self.body.len())
            .finish()
    }
}
