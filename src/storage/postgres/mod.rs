//! PostgreSQL OrderStore implementation.
//!
//! Every operation runs in its own transaction. Writes insert delivery and
//! payment first so their generated ids can be referenced by the order row,
//! then the order row, then all items in one multi-row insert.

mod schema;


use async_trait::async_trait;
use sea_query::{Cond, Expr, Order as SortOrder, PostgresQueryBuilder, Query};
use sea_query_binder::SqlxBinder;
use sqlx::postgres::PgRow;
use sqlx::{Acquire, PgConnection, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::model::{Delivery, Item, Order, Payment};
use crate::storage::{OrderStore, Result, StorageError};

use schema::{ORDER_TRACK_NUMBER_KEY, PAYMENT_TRANSACTION_KEY, UNIQUE_VIOLATION};

/// PostgreSQL implementation of OrderStore.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Create a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| StorageError::Database(format!("migration failed: {e}")))
}

/// Map a unique-constraint violation to the duplicate it represents.
///
/// Unknown constraint names are reported as a duplicate order uid.
pub(crate) fn classify_unique_violation(constraint: Option<&str>, order: &Order) -> StorageError {
    match constraint {
        Some(ORDER_TRACK_NUMBER_KEY) => {
            StorageError::DuplicateTrackNumber(order.track_number.clone())
        }
        Some(PAYMENT_TRANSACTION_KEY) => StorageError::DuplicateTransaction(order.payment.transaction),
        _ => StorageError::DuplicateOrderUid(order.order_uid),
    }
}

fn translate_insert_error(err: sqlx::Error, order: &Order) -> StorageError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return classify_unique_violation(db.constraint(), order);
        }
    }
    StorageError::from(err)
}

/// Reject the order before writing if its uid or track number is taken.
async fn ensure_unique(conn: &mut PgConnection, order: &Order) -> Result<()> {
    let (sql, values) = Query::select()
        .column(schema::Orders::OrderUid)
        .from(schema::Orders::Table)
        .cond_where(
            Cond::any()
                .add(Expr::col(schema::Orders::OrderUid).eq(order.order_uid))
                .add(Expr::col(schema::Orders::TrackNumber).eq(order.track_number.as_str())),
        )
        .build_sqlx(PostgresQueryBuilder);

    let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;
    for row in &rows {
        let existing: Uuid = row.try_get("order_uid")?;
        if existing == order.order_uid {
            return Err(StorageError::DuplicateOrderUid(order.order_uid));
        }
    }
    if !rows.is_empty() {
        return Err(StorageError::DuplicateTrackNumber(order.track_number.clone()));
    }

    let (sql, values) = Query::select()
        .column(schema::Payment::Id)
        .from(schema::Payment::Table)
        .and_where(Expr::col(schema::Payment::Transaction).eq(order.payment.transaction))
        .build_sqlx(PostgresQueryBuilder);
    if sqlx::query_with(&sql, values)
        .fetch_optional(&mut *conn)
        .await?
        .is_some()
    {
        return Err(StorageError::DuplicateTransaction(order.payment.transaction));
    }

    Ok(())
}

async fn insert_delivery(conn: &mut PgConnection, delivery: &Delivery) -> sqlx::Result<i32> {
    let (sql, values) = Query::insert()
        .into_table(schema::Delivery::Table)
        .columns([
            schema::Delivery::Name,
            schema::Delivery::Phone,
            schema::Delivery::Zip,
            schema::Delivery::City,
            schema::Delivery::Address,
            schema::Delivery::Region,
            schema::Delivery::Email,
        ])
        .values_panic([
            delivery.name.as_str().into(),
            delivery.phone.as_str().into(),
            delivery.zip.as_str().into(),
            delivery.city.as_str().into(),
            delivery.address.as_str().into(),
            delivery.region.as_str().into(),
            delivery.email.as_str().into(),
        ])
        .returning_col(schema::Delivery::Id)
        .build_sqlx(PostgresQueryBuilder);

    let row = sqlx::query_with(&sql, values).fetch_one(&mut *conn).await?;
    row.try_get("delivery_id")
}

async fn insert_payment(conn: &mut PgConnection, payment: &Payment) -> sqlx::Result<i32> {
    let (sql, values) = Query::insert()
        .into_table(schema::Payment::Table)
        .columns([
            schema::Payment::Transaction,
            schema::Payment::RequestId,
            schema::Payment::Currency,
            schema::Payment::Provider,
            schema::Payment::Amount,
            schema::Payment::PaymentDt,
            schema::Payment::Bank,
            schema::Payment::DeliveryCost,
            schema::Payment::GoodsTotal,
            schema::Payment::CustomFee,
        ])
        .values_panic([
            payment.transaction.into(),
            payment.request_id.as_str().into(),
            payment.currency.as_str().into(),
            payment.provider.as_str().into(),
            payment.amount.into(),
            payment.payment_dt.into(),
            payment.bank.as_str().into(),
            payment.delivery_cost.into(),
            payment.goods_total.into(),
            payment.custom_fee.into(),
        ])
        .returning_col(schema::Payment::Id)
        .build_sqlx(PostgresQueryBuilder);

    let row = sqlx::query_with(&sql, values).fetch_one(&mut *conn).await?;
    row.try_get("payment_id")
}

async fn insert_order_row(conn: &mut PgConnection, order: &Order) -> sqlx::Result<()> {
    let (sql, values) = Query::insert()
        .into_table(schema::Orders::Table)
        .columns([
            schema::Orders::OrderUid,
            schema::Orders::TrackNumber,
            schema::Orders::Entry,
            schema::Orders::DeliveryId,
            schema::Orders::PaymentId,
            schema::Orders::Locale,
            schema::Orders::InternalSignature,
            schema::Orders::CustomerId,
            schema::Orders::DeliveryService,
            schema::Orders::Shardkey,
            schema::Orders::SmId,
            schema::Orders::DateCreated,
            schema::Orders::OofShard,
        ])
        .values_panic([
            order.order_uid.into(),
            order.track_number.as_str().into(),
            order.entry.as_str().into(),
            order.delivery.id.into(),
            order.payment.id.into(),
            order.locale.as_str().into(),
            order.internal_signature.as_str().into(),
            order.customer_id.as_str().into(),
            order.delivery_service.as_str().into(),
            order.shardkey.as_str().into(),
            order.sm_id.into(),
            order.date_created.into(),
            order.oof_shard.as_str().into(),
        ])
        .build_sqlx(PostgresQueryBuilder);

    sqlx::query_with(&sql, values).execute(&mut *conn).await?;
    Ok(())
}

async fn insert_items(conn: &mut PgConnection, items: &[Item]) -> sqlx::Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    let mut insert = Query::insert();
    insert.into_table(schema::Item::Table).columns([
        schema::Item::ChrtId,
        schema::Item::TrackNumber,
        schema::Item::Price,
        schema::Item::Rid,
        schema::Item::Name,
        schema::Item::Sale,
        schema::Item::Size,
        schema::Item::TotalPrice,
        schema::Item::NmId,
        schema::Item::Brand,
        schema::Item::Status,
    ]);
    for item in items {
        insert.values_panic([
            item.chrt_id.into(),
            item.track_number.as_str().into(),
            item.price.into(),
            item.rid.as_str().into(),
            item.name.as_str().into(),
            item.sale.into(),
            item.size.as_str().into(),
            item.total_price.into(),
            item.nm_id.into(),
            item.brand.as_str().into(),
            item.status.into(),
        ]);
    }
    let (sql, values) = insert.build_sqlx(PostgresQueryBuilder);

    sqlx::query_with(&sql, values).execute(&mut *conn).await?;
    Ok(())
}

/// Decode an order row. Delivery and payment carry only their ids until
/// `load_owned` fills them in.
fn order_from_row(row: &PgRow) -> sqlx::Result<Order> {
    Ok(Order {
        order_uid: row.try_get("order_uid")?,
        track_number: row.try_get("track_number")?,
        entry: row.try_get("entry")?,
        delivery: Delivery {
            id: row.try_get("delivery_id")?,
            ..Delivery::default()
        },
        payment: Payment {
            id: row.try_get("payment_id")?,
            ..Payment::default()
        },
        items: Vec::new(),
        locale: row.try_get("locale")?,
        internal_signature: row.try_get("internal_signature")?,
        customer_id: row.try_get("customer_id")?,
        delivery_service: row.try_get("delivery_service")?,
        shardkey: row.try_get("shardkey")?,
        sm_id: row.try_get("sm_id")?,
        date_created: row.try_get("date_created")?,
        oof_shard: row.try_get("oof_shard")?,
    })
}

fn select_orders() -> sea_query::SelectStatement {
    Query::select()
        .columns([
            schema::Orders::OrderUid,
            schema::Orders::TrackNumber,
            schema::Orders::Entry,
            schema::Orders::DeliveryId,
            schema::Orders::PaymentId,
            schema::Orders::Locale,
            schema::Orders::InternalSignature,
            schema::Orders::CustomerId,
            schema::Orders::DeliveryService,
            schema::Orders::Shardkey,
            schema::Orders::SmId,
            schema::Orders::DateCreated,
            schema::Orders::OofShard,
        ])
        .from(schema::Orders::Table)
        .to_owned()
}

async fn fetch_delivery(conn: &mut PgConnection, id: i32) -> sqlx::Result<Option<Delivery>> {
    let (sql, values) = Query::select()
        .columns([
            schema::Delivery::Id,
            schema::Delivery::Name,
            schema::Delivery::Phone,
            schema::Delivery::Zip,
            schema::Delivery::City,
            schema::Delivery::Address,
            schema::Delivery::Region,
            schema::Delivery::Email,
        ])
        .from(schema::Delivery::Table)
        .and_where(Expr::col(schema::Delivery::Id).eq(id))
        .build_sqlx(PostgresQueryBuilder);

    let Some(row) = sqlx::query_with(&sql, values)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(Delivery {
        id: row.try_get("delivery_id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        zip: row.try_get("zip")?,
        city: row.try_get("city")?,
        address: row.try_get("address")?,
        region: row.try_get("region")?,
        email: row.try_get("email")?,
    }))
}

async fn fetch_payment(conn: &mut PgConnection, id: i32) -> sqlx::Result<Option<Payment>> {
    let (sql, values) = Query::select()
        .columns([
            schema::Payment::Id,
            schema::Payment::Transaction,
            schema::Payment::RequestId,
            schema::Payment::Currency,
            schema::Payment::Provider,
            schema::Payment::Amount,
            schema::Payment::PaymentDt,
            schema::Payment::Bank,
            schema::Payment::DeliveryCost,
            schema::Payment::GoodsTotal,
            schema::Payment::CustomFee,
        ])
        .from(schema::Payment::Table)
        .and_where(Expr::col(schema::Payment::Id).eq(id))
        .build_sqlx(PostgresQueryBuilder);

    let Some(row) = sqlx::query_with(&sql, values)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(Payment {
        id: row.try_get("payment_id")?,
        transaction: row.try_get("transaction")?,
        request_id: row.try_get("request_id")?,
        currency: row.try_get("currency")?,
        provider: row.try_get("provider")?,
        amount: row.try_get("amount")?,
        payment_dt: row.try_get("payment_dt")?,
        bank: row.try_get("bank")?,
        delivery_cost: row.try_get("delivery_cost")?,
        goods_total: row.try_get("goods_total")?,
        custom_fee: row.try_get("custom_fee")?,
    }))
}

async fn fetch_items(conn: &mut PgConnection, track_number: &str) -> sqlx::Result<Vec<Item>> {
    let (sql, values) = Query::select()
        .columns([
            schema::Item::ChrtId,
            schema::Item::TrackNumber,
            schema::Item::Price,
            schema::Item::Rid,
            schema::Item::Name,
            schema::Item::Sale,
            schema::Item::Size,
            schema::Item::TotalPrice,
            schema::Item::NmId,
            schema::Item::Brand,
            schema::Item::Status,
        ])
        .from(schema::Item::Table)
        .and_where(Expr::col(schema::Item::TrackNumber).eq(track_number))
        .order_by(schema::Item::Id, SortOrder::Asc)
        .build_sqlx(PostgresQueryBuilder);

    let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(Item {
            chrt_id: row.try_get("chrt_id")?,
            track_number: row.try_get("track_number")?,
            price: row.try_get("price")?,
            rid: row.try_get("rid")?,
            name: row.try_get("name")?,
            sale: row.try_get("sale")?,
            size: row.try_get("size")?,
            total_price: row.try_get("total_price")?,
            nm_id: row.try_get("nm_id")?,
            brand: row.try_get("brand")?,
            status: row.try_get("status")?,
        });
    }
    Ok(items)
}

/// Fill in delivery, payment and items for an order decoded from its row.
async fn load_owned(conn: &mut PgConnection, mut order: Order) -> Result<Order> {
    order.delivery = fetch_delivery(conn, order.delivery.id)
        .await?
        .ok_or_else(|| StorageError::Integrity {
            order_uid: order.order_uid,
            relation: "delivery".to_string(),
        })?;
    order.payment = fetch_payment(conn, order.payment.id)
        .await?
        .ok_or_else(|| StorageError::Integrity {
            order_uid: order.order_uid,
            relation: "payment".to_string(),
        })?;
    order.items = fetch_items(conn, &order.track_number).await?;
    Ok(order)
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        // Dropping the transaction without commit rolls back every insert.
        let mut tx = conn.begin().await?;

        ensure_unique(&mut tx, &order).await?;

        order.delivery.id = insert_delivery(&mut tx, &order.delivery)
            .await
            .map_err(|e| translate_insert_error(e, &order))?;
        order.payment.id = insert_payment(&mut tx, &order.payment)
            .await
            .map_err(|e| translate_insert_error(e, &order))?;
        insert_order_row(&mut tx, &order)
            .await
            .map_err(|e| translate_insert_error(e, &order))?;
        insert_items(&mut tx, &order.items)
            .await
            .map_err(|e| translate_insert_error(e, &order))?;

        tx.commit().await?;

        debug!(
            order_uid = %order.order_uid,
            items = order.items.len(),
            "Order persisted"
        );
        Ok(order)
    }

    async fn get_order(&self, order_uid: Uuid) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let (sql, values) = select_orders()
            .and_where(Expr::col(schema::Orders::OrderUid).eq(order_uid))
            .build_sqlx(PostgresQueryBuilder);
        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound(order_uid))?;

        let order = order_from_row(&row)?;
        let order = load_owned(&mut tx, order).await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let (sql, values) = select_orders()
            .order_by(schema::Orders::DateCreated, SortOrder::Asc)
            .order_by(schema::Orders::OrderUid, SortOrder::Asc)
            .build_sqlx(PostgresQueryBuilder);
        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *tx).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order = order_from_row(row)?;
            orders.push(load_owned(&mut tx, order).await?);
        }

        tx.commit().await?;
        debug!(count = orders.len(), "Loaded all orders");
        Ok(orders)
    }
}
