//! Input validation for orders and order identifiers.
//!
//! Everything that arrives from the stream or from a lookup request crosses a
//! trust boundary and is checked here before it reaches storage. Validation
//! stops at the first failing field.

use uuid::Uuid;

use crate::model::{Delivery, Item, Order, Payment};

/// Result type for validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised by validation. Always caller-caused; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid order identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("invalid field '{field}': {message}")]
    Field { field: String, message: String },
}

impl ValidationError {
    fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Numeric limits for validated fields.
pub mod limits {
    /// Smallest allowed discount percentage.
    pub const MIN_SALE: i32 = 0;
    /// Largest allowed discount percentage.
    pub const MAX_SALE: i32 = 100;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const REQUIRED: &str = "is required";
    pub const NIL_UUID: &str = "must not be the nil UUID";
    pub const NEGATIVE: &str = "must be greater than or equal to 0";
    pub const NOT_POSITIVE: &str = "must be greater than 0";
    pub const SALE_RANGE: &str = "must be between 0 and 100";
    pub const TRACK_MISMATCH: &str = "must match the order track_number";
    pub const DATE_UNSET: &str = "must be after the unix epoch";
}

/// Parse an order identifier.
pub fn parse_order_uid(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| ValidationError::InvalidIdentifier(id.to_string()))
}

/// Validate an order and everything it owns.
pub fn validate_order(order: &Order) -> Result<()> {
    if order.order_uid.is_nil() {
        return Err(ValidationError::field("order_uid", errmsg::NIL_UUID));
    }
    required("track_number", &order.track_number)?;
    required("entry", &order.entry)?;
    required("locale", &order.locale)?;
    required("customer_id", &order.customer_id)?;
    required("delivery_service", &order.delivery_service)?;
    required("shardkey", &order.shardkey)?;
    non_negative("sm_id", order.sm_id)?;
    if order.date_created.timestamp() <= 0 {
        return Err(ValidationError::field("date_created", errmsg::DATE_UNSET));
    }

    validate_delivery(&order.delivery)?;
    validate_payment(&order.payment)?;

    for (idx, item) in order.items.iter().enumerate() {
        validate_item(idx, item, &order.track_number)?;
    }

    Ok(())
}

fn validate_delivery(delivery: &Delivery) -> Result<()> {
    required("delivery.name", &delivery.name)?;
    required("delivery.phone", &delivery.phone)?;
    required("delivery.city", &delivery.city)
}

fn validate_payment(payment: &Payment) -> Result<()> {
    if payment.transaction.is_nil() {
        return Err(ValidationError::field("payment.transaction", errmsg::NIL_UUID));
    }
    required("payment.currency", &payment.currency)?;
    required("payment.provider", &payment.provider)?;
    required("payment.bank", &payment.bank)?;
    non_negative("payment.amount", payment.amount)?;
    if payment.payment_dt <= 0 {
        return Err(ValidationError::field("payment.payment_dt", errmsg::NOT_POSITIVE));
    }
    non_negative("payment.delivery_cost", payment.delivery_cost)?;
    non_negative("payment.goods_total", payment.goods_total)?;
    non_negative("payment.custom_fee", payment.custom_fee)
}

fn validate_item(idx: usize, item: &Item, order_track: &str) -> Result<()> {
    let field = |name: &str| format!("items[{}].{}", idx, name);

    if item.chrt_id == 0 {
        return Err(ValidationError::field(field("chrt_id"), errmsg::REQUIRED));
    }
    required(&field("track_number"), &item.track_number)?;
    if item.track_number != order_track {
        return Err(ValidationError::field(
            field("track_number"),
            errmsg::TRACK_MISMATCH,
        ));
    }
    required(&field("rid"), &item.rid)?;
    required(&field("name"), &item.name)?;
    non_negative(&field("price"), item.price)?;
    if !(limits::MIN_SALE..=limits::MAX_SALE).contains(&item.sale) {
        return Err(ValidationError::field(field("sale"), errmsg::SALE_RANGE));
    }
    non_negative(&field("total_price"), item.total_price)?;
    non_negative(&field("nm_id"), item.nm_id)?;
    if item.status <= 0 {
        return Err(ValidationError::field(field("status"), errmsg::NOT_POSITIVE));
    }
    Ok(())
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::field(field, errmsg::REQUIRED));
    }
    Ok(())
}

fn non_negative(field: &str, value: i32) -> Result<()> {
    if value < 0 {
        return Err(ValidationError::field(field, errmsg::NEGATIVE));
    }
    Ok(())
}
