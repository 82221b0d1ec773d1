//! Mock order source for testing.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::{BusError, InboundMessage, OrderSource, Result};

/// Topic name reported by mock messages.
pub const MOCK_TOPIC: &str = "orders";

enum Queued {
    Message(InboundMessage),
    FetchError(String),
}

/// Mock order source backed by an in-memory queue.
///
/// Offsets are assigned in push order starting at 0. Dropping the sender
/// with `close` makes `fetch` report the end of the stream once the queue
/// is drained; until then `fetch` waits like a real broker.
pub struct MockOrderSource {
    tx: RwLock<Option<mpsc::UnboundedSender<Queued>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Queued>>,
    next_offset: AtomicI64,
    fetch_calls: AtomicUsize,
    committed: RwLock<Vec<i64>>,
    fail_on_commit: RwLock<bool>,
}

impl Default for MockOrderSource {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: RwLock::new(Some(tx)),
            rx: Mutex::new(rx),
            next_offset: AtomicI64::new(0),
            fetch_calls: AtomicUsize::new(0),
            committed: RwLock::new(Vec::new()),
            fail_on_commit: RwLock::new(false),
        }
    }
}

impl MockOrderSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw payload. Returns the offset it will be delivered with.
    pub async fn push(&self, payload: impl Into<Vec<u8>>) -> i64 {
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        let message = InboundMessage {
            topic: MOCK_TOPIC.to_string(),
            partition: 0,
            offset,
            payload: payload.into(),
        };
        self.send(Queued::Message(message)).await;
        offset
    }

    /// Queue a JSON-encoded value.
    pub async fn push_json<T: serde::Serialize>(&self, value: &T) -> i64 {
        let payload = serde_json::to_vec(value).unwrap_or_default();
        self.push(payload).await
    }

    /// Make the next fetch, in queue order, fail with a broker error.
    pub async fn push_fetch_error(&self, message: &str) {
        self.send(Queued::FetchError(message.to_string())).await;
    }

    /// Stop accepting messages; `fetch` returns `None` after the queue drains.
    pub async fn close(&self) {
        self.tx.write().await.take();
    }

    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.fail_on_commit.write().await = fail;
    }

    /// Offsets acknowledged so far, in commit order.
    pub async fn committed_offsets(&self) -> Vec<i64> {
        self.committed.read().await.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn send(&self, queued: Queued) {
        if let Some(tx) = self.tx.read().await.as_ref() {
            // The receiver lives as long as self.
            let _ = tx.send(queued);
        }
    }
}

#[async_trait]
impl OrderSource for MockOrderSource {
    async fn fetch(&self) -> Result<Option<InboundMessage>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.rx.lock().await.recv().await {
            Some(Queued::Message(message)) => Ok(Some(message)),
            Some(Queued::FetchError(message)) => Err(BusError::Fetch(message)),
            None => Ok(None),
        }
    }

    async fn commit(&self, message: &InboundMessage) -> Result<()> {
        if *self.fail_on_commit.read().await {
            return Err(BusError::Commit("Mock commit failure".to_string()));
        }
        self.committed.write().await.push(message.offset);
        Ok(())
    }
}
