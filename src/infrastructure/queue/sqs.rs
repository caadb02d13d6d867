use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::{debug, info, warn};

use super::{Acker, CompletionSource, Delivery, QueueError, TranscodePublisher};
use crate::modules::content::events::TranscodeRequest;

const MAX_BATCH: i32 = 10;

#[derive(Clone)]
pub struct SqsPublisher {
    client: Client,
    queue_url: String,
}

impl SqsPublisher {
    pub fn new(client: Client, queue_url: &str) -> Self {
        info!("✅ SQS publisher ready for {}", queue_url);
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl TranscodePublisher for SqsPublisher {
    async fn publish(&self, request: &TranscodeRequest) -> Result<(), QueueError> {
        let body = serde_json::to_string(request)?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Backend(format!("SendMessage failed: {}", e)))?;

        Ok(())
    }
}

/// Long-polling consumer. Rejected messages are left in flight: the visibility
/// timeout redelivers them and the queue's redrive policy dead-letters repeats.
#[derive(Clone)]
pub struct SqsCompletionSource {
    client: Client,
    queue_url: String,
    wait_secs: i32,
}

impl SqsCompletionSource {
    pub fn new(client: Client, queue_url: &str, wait_secs: i32) -> Self {
        info!("✅ SQS consumer ready for {}", queue_url);
        Self {
            client,
            queue_url: queue_url.to_string(),
            wait_secs,
        }
    }
}

#[async_trait]
impl CompletionSource for SqsCompletionSource {
    async fn receive(&self) -> Result<Vec<Delivery>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(MAX_BATCH)
            .wait_time_seconds(self.wait_secs)
            .send()
            .await
            .map_err(|e| QueueError::Backend(format!("ReceiveMessage failed: {}", e)))?;

        let mut deliveries = Vec::new();
        for message in output.messages.unwrap_or_default() {
            let message_id = message.message_id.unwrap_or_default();
            let Some(receipt_handle) = message.receipt_handle else {
                warn!(%message_id, "SQS message without receipt handle, skipping");
                continue;
            };
            let body = message.body.unwrap_or_default().into_bytes();
            let acker = SqsAcker {
                client: self.client.clone(),
                queue_url: self.queue_url.clone(),
                receipt_handle,
            };
            deliveries.push(Delivery::new(message_id, body, Box::new(acker)));
        }

        Ok(deliveries)
    }
}

struct SqsAcker {
    client: Client,
    queue_url: String,
    receipt_handle: String,
}

#[async_trait]
impl Acker for SqsAcker {
    async fn ack(&self) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&self.receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Backend(format!("DeleteMessage failed: {}", e)))?;
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<(), QueueError> {
        debug!(requeue, "Leaving SQS message for redelivery");
        Ok(())
    }
}
