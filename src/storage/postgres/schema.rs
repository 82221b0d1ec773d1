//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The DDL itself lives in `migrations/postgres`.

use sea_query::Iden;

/// Orders table schema. The table is named `order`, which sea-query quotes.
#[derive(Iden)]
pub enum Orders {
    #[iden = "order"]
    Table,
    #[iden = "order_uid"]
    OrderUid,
    #[iden = "track_number"]
    TrackNumber,
    #[iden = "entry"]
    Entry,
    #[iden = "delivery_id"]
    DeliveryId,
    #[iden = "payment_id"]
    PaymentId,
    #[iden = "locale"]
    Locale,
    #[iden = "internal_signature"]
    InternalSignature,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "delivery_service"]
    DeliveryService,
    #[iden = "shardkey"]
    Shardkey,
    #[iden = "sm_id"]
    SmId,
    #[iden = "date_created"]
    DateCreated,
    #[iden = "oof_shard"]
    OofShard,
}

/// Delivery table schema.
#[derive(Iden)]
pub enum Delivery {
    Table,
    #[iden = "delivery_id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "phone"]
    Phone,
    #[iden = "zip"]
    Zip,
    #[iden = "city"]
    City,
    #[iden = "address"]
    Address,
    #[iden = "region"]
    Region,
    #[iden = "email"]
    Email,
}

/// Payment table schema.
#[derive(Iden)]
pub enum Payment {
    Table,
    #[iden = "payment_id"]
    Id,
    #[iden = "transaction"]
    Transaction,
    #[iden = "request_id"]
    RequestId,
    #[iden = "currency"]
    Currency,
    #[iden = "provider"]
    Provider,
    #[iden = "amount"]
    Amount,
    #[iden = "payment_dt"]
    PaymentDt,
    #[iden = "bank"]
    Bank,
    #[iden = "delivery_cost"]
    DeliveryCost,
    #[iden = "goods_total"]
    GoodsTotal,
    #[iden = "custom_fee"]
    CustomFee,
}

/// Item table schema.
#[derive(Iden)]
pub enum Item {
    Table,
    #[iden = "item_id"]
    Id,
    #[iden = "chrt_id"]
    ChrtId,
    #[iden = "track_number"]
    TrackNumber,
    #[iden = "price"]
    Price,
    #[iden = "rid"]
    Rid,
    #[iden = "name"]
    Name,
    #[iden = "sale"]
    Sale,
    #[iden = "size"]
    Size,
    #[iden = "total_price"]
    TotalPrice,
    #[iden = "nm_id"]
    NmId,
    #[iden = "brand"]
    Brand,
    #[iden = "status"]
    Status,
}

/// Unique constraint on `order.track_number`.
pub const ORDER_TRACK_NUMBER_KEY: &str = "order_track_number_key";
/// Unique constraint on `payment.transaction`.
pub const PAYMENT_TRANSACTION_KEY: &str = "payment_transaction_key";
/// PostgreSQL SQLSTATE for unique_violation.
pub const UNIQUE_VIOLATION: &str = "23505";
