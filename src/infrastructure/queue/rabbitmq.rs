use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::{
    acker::Acker as LapinAcker, options::*, types::FieldTable, BasicProperties, Channel,
    Connection, ConnectionProperties, Consumer,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{Acker, CompletionSource, Delivery, QueueError, TranscodePublisher};
use crate::modules::content::events::TranscodeRequest;

#[derive(Clone)]
pub struct RabbitMqService {
    url: String,
    conn: Arc<Mutex<Connection>>,
    channel: Arc<Mutex<Channel>>,
}

impl RabbitMqService {
    async fn connect(url: &str) -> Result<(Connection, Channel)> {
        info!("Connecting to RabbitMQ");
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let channel = conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create channel: {}", e))?;

        info!("✅ Connected to RabbitMQ");
        Ok((conn, channel))
    }

    pub async fn new(url: &str) -> Result<Self> {
        let (conn, channel) = Self::connect(url).await?;

        Ok(Self {
            url: url.to_string(),
            conn: Arc::new(Mutex::new(conn)),
            channel: Arc::new(Mutex::new(channel)),
        })
    }

    async fn reconnect(&self) -> Result<()> {
        warn!("RabbitMQ connection dropped, reconnecting...");
        let (conn, channel) = Self::connect(&self.url).await?;
        *self.conn.lock().await = conn;
        *self.channel.lock().await = channel;
        Ok(())
    }

    async fn declare(channel: &Channel, queue: &str) -> Result<()> {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare queue: {}", e))?;
        Ok(())
    }

    async fn publish_internal(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let channel = self.channel.lock().await;

        Self::declare(&channel, queue).await?;

        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish message: {}", e))?
            .await
            .map_err(|e| anyhow!("Failed to confirm publication: {}", e))?;

        Ok(())
    }

    pub async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        if let Err(e) = self.publish_internal(queue, payload).await {
            warn!("RabbitMQ publish failed: {}. Retrying after reconnect.", e);
            self.reconnect().await?;
            self.publish_internal(queue, payload).await?;
        }

        Ok(())
    }

    /// Opens a dedicated consuming channel so publishes never wait behind it.
    async fn subscribe(&self, subscription: &Subscription) -> Result<(Channel, Consumer)> {
        let channel = self
            .conn
            .lock()
            .await
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create consumer channel: {}", e))?;

        Self::declare(&channel, &subscription.queue).await?;

        channel
            .basic_qos(subscription.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set prefetch: {}", e))?;

        let consumer = channel
            .basic_consume(
                &subscription.queue,
                &subscription.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer: {}", e))?;

        info!(
            "RabbitMQ consumer '{}' listening on '{}'",
            subscription.consumer_tag, subscription.queue
        );
        Ok((channel, consumer))
    }

    /// Subscribes again after the consumer stream ended, reconnecting first
    /// when the connection itself is gone.
    async fn resubscribe(&self, subscription: &Subscription) -> Result<(Channel, Consumer)> {
        match self.subscribe(subscription).await {
            Ok(subscribed) => Ok(subscribed),
            Err(e) => {
                warn!("RabbitMQ resubscribe failed: {}. Retrying after reconnect.", e);
                self.reconnect().await?;
                self.subscribe(subscription).await
            }
        }
    }

    pub async fn consume(&self, queue: &str, consumer_tag: &str, prefetch: u16) -> Result<RabbitMqCompletionSource> {
        let subscription = Subscription {
            queue: queue.to_string(),
            consumer_tag: consumer_tag.to_string(),
            prefetch,
        };
        let subscribed = self.subscribe(&subscription).await?;

        Ok(RabbitMqCompletionSource {
            service: self.clone(),
            subscription,
            active: Mutex::new(Some(subscribed)),
        })
    }
}

/// Publishes transcode requests to a named durable queue.
#[derive(Clone)]
pub struct RabbitMqPublisher {
    service: RabbitMqService,
    queue: String,
}

impl RabbitMqPublisher {
    pub fn new(service: RabbitMqService, queue: &str) -> Self {
        Self {
            service,
            queue: queue.to_string(),
        }
    }
}

#[async_trait]
impl TranscodePublisher for RabbitMqPublisher {
    async fn publish(&self, request: &TranscodeRequest) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(request)?;
        self.service
            .publish(&self.queue, &payload)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }
}

struct Subscription {
    queue: String,
    consumer_tag: String,
    prefetch: u16,
}

/// Completion messages from one durable queue. When the consumer stream ends
/// the subscription is dropped and rebuilt on the next receive.
pub struct RabbitMqCompletionSource {
    service: RabbitMqService,
    subscription: Subscription,
    active: Mutex<Option<(Channel, Consumer)>>,
}

#[async_trait]
impl CompletionSource for RabbitMqCompletionSource {
    async fn receive(&self) -> Result<Vec<Delivery>, QueueError> {
        let mut active = self.active.lock().await;

        let subscribed = match active.take() {
            Some(subscribed) => subscribed,
            None => self
                .service
                .resubscribe(&self.subscription)
                .await
                .map_err(|e| QueueError::Backend(e.to_string()))?,
        };
        let (_, consumer) = active.insert(subscribed);
        let next = consumer.next().await;

        match next {
            Some(Ok(delivery)) => {
                let message_id = delivery.delivery_tag.to_string();
                let acker = RabbitMqAcker(delivery.acker);
                Ok(vec![Delivery::new(message_id, delivery.data, Box::new(acker))])
            }
            Some(Err(e)) => {
                *active = None;
                Err(QueueError::Backend(format!("Consumer error: {}", e)))
            }
            None => {
                warn!(queue = %self.subscription.queue, "RabbitMQ consumer stream ended");
                *active = None;
                Err(QueueError::Closed)
            }
        }
    }
}

struct RabbitMqAcker(LapinAcker);

#[async_trait]
impl Acker for RabbitMqAcker {
    async fn ack(&self) -> Result<(), QueueError> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| QueueError::Backend(format!("Failed to ack message: {}", e)))?;
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<(), QueueError> {
        self.0
            .nack(BasicNackOptions {
                requeue,
                ..BasicNackOptions::default()
            })
            .await
            .map_err(|e| QueueError::Backend(format!("Failed to nack message: {}", e)))?;
        Ok(())
    }
}
