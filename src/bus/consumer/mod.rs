//! Sequential order consumer.
//!
//! Each message goes through `fetch -> decode -> ingest -> commit`, one at a
//! time. The offset is committed whether the order was persisted or
//! rejected, so a poison message is skipped instead of stalling the stream.
//! Cancellation stops the loop without committing anything further.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{InboundMessage, OrderSource};
use crate::model::Order;
use crate::services::{ErrorKind, OrderService};

/// Terminal state of one message before acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Decoded and stored.
    Persisted,
    /// Payload was not a valid order document.
    DecodeFailed,
    /// Decoded but rejected by validation or storage.
    PersistFailed,
}

/// Counters reported when the consumer loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub persisted: u64,
    pub skipped: u64,
    pub commit_failures: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Persisted => self.persisted += 1,
            MessageOutcome::DecodeFailed | MessageOutcome::PersistFailed => self.skipped += 1,
        }
    }
}

/// Drains an `OrderSource` into the `OrderService`.
pub struct OrderConsumer {
    source: Arc<dyn OrderSource>,
    service: Arc<OrderService>,
}

impl OrderConsumer {
    pub fn new(source: Arc<dyn OrderSource>, service: Arc<OrderService>) -> Self {
        Self { source, service }
    }

    /// Run until cancelled or until the source closes.
    pub async fn run(&self, cancel: CancellationToken) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        info!("Order consumer started");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Order consumer cancelled");
                    break;
                }
                fetched = self.source.fetch() => fetched,
            };

            let message = match fetched {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("Order source closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to fetch message");
                    continue;
                }
            };

            let outcome = self.process(&message).await;
            stats.record(outcome);

            // An ingest already in flight is allowed to finish, but a
            // cancelled consumer acknowledges nothing more.
            if cancel.is_cancelled() {
                info!(
                    offset = message.offset,
                    "Order consumer cancelled before commit"
                );
                break;
            }

            if let Err(e) = self.source.commit(&message).await {
                stats.commit_failures += 1;
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Failed to commit offset"
                );
            }
        }

        info!(
            persisted = stats.persisted,
            skipped = stats.skipped,
            commit_failures = stats.commit_failures,
            "Order consumer stopped"
        );
        stats
    }

    /// Decode and ingest one message.
    pub async fn process(&self, message: &InboundMessage) -> MessageOutcome {
        let order: Order = match serde_json::from_slice(&message.payload) {
            Ok(order) => order,
            Err(e) => {
                warn!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Skipping undecodable message"
                );
                return MessageOutcome::DecodeFailed;
            }
        };

        let order_uid = order.order_uid;
        match self.service.ingest(order).await {
            Ok(_) => {
                debug!(order_uid = %order_uid, offset = message.offset, "Message persisted");
                MessageOutcome::Persisted
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal | ErrorKind::Integrity => error!(
                        order_uid = %order_uid,
                        offset = message.offset,
                        error = %e,
                        "Skipping order after storage failure"
                    ),
                    kind => warn!(
                        order_uid = %order_uid,
                        offset = message.offset,
                        kind = ?kind,
                        error = %e,
                        "Skipping rejected order"
                    ),
                }
                MessageOutcome::PersistFailed
            }
        }
    }
}
