use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::common::timeout::with_timeout;
use crate::infrastructure::catalog::{CatalogError, CatalogStore};
use crate::infrastructure::queue::{CompletionSource, Delivery, QueueError};
use crate::modules::content::completion::{parse_completion, EnvelopeError};
use crate::modules::content::model::ContentStatus;

const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

/// What happened to one completion message.
#[derive(Debug)]
pub enum Outcome {
    Committed { content_id: String, renditions: usize },
    Malformed(EnvelopeError),
    /// The event names a row the catalog never committed.
    Orphaned(String),
    CatalogFailed(CatalogError),
}

/// Parses one completion message and overwrites the row's status and
/// renditions. Replays of the same event leave the row unchanged.
pub async fn reconcile(catalog: &dyn CatalogStore, body: &[u8], io_timeout: Duration) -> Outcome {
    let completion = match parse_completion(body) {
        Ok(completion) => completion,
        Err(e) => return Outcome::Malformed(e),
    };

    let update = catalog.update_status_and_renditions(
        completion.content_id(),
        ContentStatus::TranscodingComplete,
        &completion.renditions,
    );

    match with_timeout(io_timeout, update).await {
        Ok(()) => Outcome::Committed {
            content_id: completion.request.content_id,
            renditions: completion.renditions.len(),
        },
        Err(CatalogError::NotFound(content_id)) => Outcome::Orphaned(content_id),
        Err(e) => Outcome::CatalogFailed(e),
    }
}

/// Acks committed messages, dead-letters ones that can never succeed and
/// hands catalog failures back for redelivery. A settle call that outlives
/// `io_timeout` is abandoned; the transport redelivers the message.
async fn settle(worker: usize, delivery: Delivery, outcome: Outcome, io_timeout: Duration) {
    let message_id = delivery.message_id.clone();

    let settled = match outcome {
        Outcome::Committed { content_id, renditions } => {
            info!(worker, %message_id, %content_id, renditions, "✅ Content marked TRANSCODINGCOMPLETE");
            with_timeout(io_timeout, delivery.ack()).await
        }
        Outcome::Malformed(e) => {
            error!(worker, %message_id, error = %e, "Rejecting malformed completion message");
            with_timeout(io_timeout, delivery.reject(false)).await
        }
        Outcome::Orphaned(content_id) => {
            error!(worker, %message_id, %content_id, "Completion for unknown content, rejecting");
            with_timeout(io_timeout, delivery.reject(false)).await
        }
        Outcome::CatalogFailed(e) => {
            warn!(worker, %message_id, error = %e, "Catalog update failed, leaving message for redelivery");
            with_timeout(io_timeout, delivery.reject(true)).await
        }
    };

    if let Err(e) = settled {
        error!(worker, %message_id, error = %e, "Failed to settle completion message");
    }
}

/// Receive loop feeding a fixed pool of workers. Each worker takes a message
/// from parse to catalog commit before settling it.
pub struct CompletionConsumer {
    catalog: Arc<dyn CatalogStore>,
    source: Arc<dyn CompletionSource>,
    workers: usize,
    io_timeout: Duration,
    receive_wait: Duration,
}

impl CompletionConsumer {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        source: Arc<dyn CompletionSource>,
        workers: usize,
        io_timeout: Duration,
        receive_wait: Duration,
    ) -> Self {
        Self {
            catalog,
            source,
            workers: workers.max(1),
            io_timeout,
            receive_wait,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!("🎥 Completion consumer starting with {} workers", self.workers);

        let (tx, rx) = async_channel::bounded::<Delivery>(self.workers);
        let mut pool = JoinSet::new();
        for worker in 0..self.workers {
            pool.spawn(worker_loop(
                worker,
                self.catalog.clone(),
                rx.clone(),
                self.io_timeout,
                shutdown.clone(),
            ));
        }
        drop(rx);

        // A long poll holds the call for up to `receive_wait`.
        let receive_limit = self.io_timeout + self.receive_wait;

        'receive: loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => break,
                batch = with_timeout(receive_limit, self.source.receive()) => batch,
            };

            match batch {
                Ok(deliveries) => {
                    for delivery in deliveries {
                        tokio::select! {
                            _ = shutdown.cancelled() => break 'receive,
                            sent = tx.send(delivery) => {
                                if sent.is_err() {
                                    break 'receive;
                                }
                            }
                        }
                    }
                }
                Err(QueueError::Timeout(limit)) => {
                    debug!(?limit, "No completion messages before the receive deadline");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to receive completion messages, backing off");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECEIVE_BACKOFF) => {}
                    }
                }
            }
        }

        tx.close();
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!("Completion worker failed: {}", e);
            }
        }
        info!("Completion consumer stopped");
    }
}

async fn worker_loop(
    worker: usize,
    catalog: Arc<dyn CatalogStore>,
    rx: Receiver<Delivery>,
    io_timeout: Duration,
    shutdown: CancellationToken,
) {
    while let Ok(delivery) = rx.recv().await {
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                warn!(worker, message_id = %delivery.message_id, "Shutting down mid-message, leaving it unacknowledged");
                return;
            }
            outcome = reconcile(catalog.as_ref(), &delivery.body, io_timeout) => outcome,
        };
        settle(worker, delivery, outcome, io_timeout).await;
    }
}
