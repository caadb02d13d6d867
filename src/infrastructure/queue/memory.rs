use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Acker, CompletionSource, Delivery, QueueError, TranscodePublisher};
use crate::modules::content::events::TranscodeRequest;

/// Test double recording every published request.
#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<TranscodeRequest>>,
    pub fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn sent(&self) -> Vec<TranscodeRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscodePublisher for RecordingPublisher {
    async fn publish(&self, request: &TranscodeRequest) -> Result<(), QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Backend("publish refused".into()));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Rejected { requeue: bool },
}

pub type Ledger = Arc<Mutex<Vec<(String, Settlement)>>>;

/// Test double handing out queued bodies one batch at a time and recording
/// how each delivery was settled. Unsettled deliveries never appear in the ledger.
#[derive(Default)]
pub struct MemorySource {
    pending: Mutex<VecDeque<(String, Vec<u8>)>>,
    ledger: Ledger,
    closed: AtomicBool,
}

impl MemorySource {
    pub fn push(&self, message_id: &str, body: impl Into<Vec<u8>>) {
        self.pending
            .lock()
            .unwrap()
            .push_back((message_id.to_string(), body.into()));
    }

    /// The next receive reports the stream as closed, as a dropped broker
    /// connection would.
    pub fn close_once(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger.clone()
    }

    pub fn settlements(&self) -> Vec<(String, Settlement)> {
        self.ledger.lock().unwrap().clone()
    }

    pub fn delivery(&self, message_id: &str, body: impl Into<Vec<u8>>) -> Delivery {
        Delivery::new(
            message_id,
            body.into(),
            Box::new(MemoryAcker {
                message_id: message_id.to_string(),
                ledger: self.ledger.clone(),
            }),
        )
    }
}

#[async_trait]
impl CompletionSource for MemorySource {
    async fn receive(&self) -> Result<Vec<Delivery>, QueueError> {
        if self.closed.swap(false, Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        let next = self.pending.lock().unwrap().pop_front();
        match next {
            Some((id, body)) => Ok(vec![self.delivery(&id, body)]),
            None => {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }
}

struct MemoryAcker {
    message_id: String,
    ledger: Ledger,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), QueueError> {
        self.ledger
            .lock()
            .unwrap()
            .push((self.message_id.clone(), Settlement::Acked));
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<(), QueueError> {
        self.ledger
            .lock()
            .unwrap()
            .push((self.message_id.clone(), Settlement::Rejected { requeue }));
        Ok(())
    }
}
