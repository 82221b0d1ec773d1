//! Order fixtures for unit and integration tests.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::model::{Delivery, Item, Order, Payment};

/// Build a valid order with a fresh UID, fresh transaction and the given
/// track number, carrying `item_count` items.
pub fn sample_order(track_number: &str, item_count: usize) -> Order {
    let items = (0..item_count)
        .map(|i| sample_item(track_number, i as i32 + 1))
        .collect();

    Order {
        order_uid: Uuid::new_v4(),
        track_number: track_number.to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            id: 0,
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            id: 0,
            transaction: Uuid::new_v4(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1_637_907_727,
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items,
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        // Whole seconds so the value survives PostgreSQL's microsecond precision.
        date_created: Utc
            .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
            .single()
            .unwrap_or_else(Utc::now),
        oof_shard: "1".to_string(),
    }
}

/// Build a valid item for the given track number.
pub fn sample_item(track_number: &str, chrt_id: i32) -> Item {
    Item {
        chrt_id,
        track_number: track_number.to_string(),
        price: 453,
        rid: format!("ab4219087a764ae0btest{}", chrt_id),
        name: "Mascaras".to_string(),
        sale: 0,
        size: "0".to_string(),
        total_price: 453,
        nm_id: 2_389_212,
        brand: "Vivienne Sabo".to_string(),
        status: 202,
    }
}

/// Unique track number for tests sharing one database.
pub fn unique_track() -> String {
    format!("TRACK-{}", Uuid::new_v4().simple())
}
