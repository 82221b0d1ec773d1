//! Order object graph.
//!
//! One `Order` owns exactly one `Delivery` and one `Payment`, plus any
//! number of `Item`s that share its track number. The JSON field names are
//! the inbound message contract and the HTTP response body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A complete order as ingested from the stream and returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_uid: Uuid,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    #[serde(default)]
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i32,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub oof_shard: String,
}

/// Recipient details. Owned 1:1 by an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Surrogate key assigned by the store.
    #[serde(skip)]
    pub id: i32,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub zip: String,
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub email: String,
}

/// Payment details. Owned 1:1 by an order; `transaction` is globally unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Surrogate key assigned by the store.
    #[serde(skip)]
    pub id: i32,
    pub transaction: Uuid,
    #[serde(default)]
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i32,
    /// Unix timestamp, seconds.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i32,
    pub goods_total: i32,
    pub custom_fee: i32,
}

/// A line item, joined to its order by `track_number` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub chrt_id: i32,
    pub track_number: String,
    pub price: i32,
    pub rid: String,
    pub name: String,
    /// Discount percentage, 0..=100.
    pub sale: i32,
    #[serde(default)]
    pub size: String,
    pub total_price: i32,
    pub nm_id: i32,
    #[serde(default)]
    pub brand: String,
    pub status: i32,
}

impl Order {
    /// Clear store-assigned surrogate keys.
    ///
    /// Two orders that differ only by surrogate keys describe the same
    /// business data; tests and callers comparing wire payloads use this.
    pub fn without_surrogate_ids(mut self) -> Self {
        self.delivery.id = 0;
        self.payment.id = 0;
        self
    }
}
