//! Inbound order stream.
//!
//! This module contains:
//! - `OrderSource` trait: fetch and acknowledge raw messages
//! - `OrderConsumer`: the sequential decode / ingest / acknowledge loop
//! - Implementations: Kafka (feature `kafka`), Mock

use async_trait::async_trait;

pub mod consumer;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod mock;

pub use consumer::{ConsumerStats, MessageOutcome, OrderConsumer};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaOrderSource, KafkaSourceConfig};
pub use mock::MockOrderSource;

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur while talking to the message broker.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Commit failed: {0}")]
    Commit(String),
}

/// A raw message as delivered by the broker, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

/// Source of order messages.
///
/// Implementations:
/// - `KafkaOrderSource`: Kafka consumer group member
/// - `MockOrderSource`: In-memory queue for testing
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Wait for the next message.
    ///
    /// Returns `Ok(None)` once the source is closed and will never yield
    /// another message. Must be safe to drop mid-wait.
    async fn fetch(&self) -> Result<Option<InboundMessage>>;

    /// Acknowledge a message so it is not delivered again to this group.
    async fn commit(&self, message: &InboundMessage) -> Result<()>;
}
