use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, Version};
use domain::{
    CustomerId, Money, Order, OrderCharges, OrderLine, OrderStatus, OrderTransition,
    ShippingAddress,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    order_store::{OrderStore, TransitionRecord},
};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let lines_json: serde_json::Value = row.try_get("lines")?;
        let lines: Vec<OrderLine> = serde_json::from_value(lines_json)?;

        let address_json: serde_json::Value = row.try_get("shipping_address")?;
        let shipping_address: ShippingAddress = serde_json::from_value(address_json)?;

        let status_text: String = row.try_get("status")?;
        let status = OrderStatus::from_wire(&status_text).ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
                "unknown order status: {status_text}"
            ))))
        })?;

        Ok(Order::rehydrate(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            lines,
            shipping_address,
            OrderCharges::from_cents(
                row.try_get("shipping_cents")?,
                row.try_get("tax_cents")?,
                row.try_get("discount_cents")?,
            ),
            Money::from_cents(row.try_get("total_cents")?),
            status,
            row.try_get("gateway_reference")?,
            Version::new(row.try_get("version")?),
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            row.try_get::<DateTime<Utc>, _>("updated_at")?,
        ))
    }
}

const SELECT_COLUMNS: &str = "id, customer_id, lines, shipping_address, shipping_cents, \
     tax_cents, discount_cents, total_cents, status, gateway_reference, version, \
     created_at, updated_at";

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let lines_json = serde_json::to_value(order.lines())?;
        let address_json = serde_json::to_value(order.shipping_address())?;
        let charges = order.charges();

        let result = sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, lines, shipping_address, shipping_cents,
                tax_cents, discount_cents, total_cents, status, gateway_reference, version,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(lines_json)
        .bind(address_json)
        .bind(charges.shipping.cents())
        .bind(charges.tax.cents())
        .bind(charges.discount.cents())
        .bind(order.total().cents())
        .bind(order.status().as_str())
        .bind(order.gateway_reference())
        .bind(order.version().as_i64())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateOrder(order.id()));
        }
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn apply_transition(
        &self,
        order_id: OrderId,
        expected_version: Version,
        transition: OrderTransition,
    ) -> Result<TransitionRecord> {
        // Row lock + version check + update in one transaction: the lock
        // serializes concurrent transitions, the version check rejects the
        // loser deterministically.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or(StoreError::OrderNotFound(order_id))?;
        let mut order = Self::row_to_order(row)?;

        if order.version() != expected_version {
            return Err(StoreError::StaleOrderVersion {
                order_id,
                expected: expected_version,
                actual: order.version(),
            });
        }

        let previous = order.apply(&transition)?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, gateway_reference = $3, version = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.status().as_str())
        .bind(order.gateway_reference())
        .bind(order.version().as_i64())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        metrics::counter!("order_transitions_total").increment(1);
        tracing::debug!(
            %order_id,
            transition = transition.label(),
            from = %previous,
            to = %order.status(),
            "order transition applied"
        );

        Ok(TransitionRecord {
            order,
            previous,
            transition,
        })
    }
}
