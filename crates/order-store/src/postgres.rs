use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{IdempotencyKey, OrderId};
use sqlx::{PgPool, Row, postgres::PgRow};

use domain::{
    IdempotencyStore, ListFilter, Order, OrderStatus, OrderStore, StoreError, StoredResponse,
};

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Runs the database migrations for both tables.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Issues a trivial query to check the database is reachable.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(StoreError::backend)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// PostgreSQL-backed order store.
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

    fn row_to_order(row: PgRow) -> Result<Order, StoreError> {
        let status: String = row.try_get("status").map_err(StoreError::backend)?;
        let status: OrderStatus = status.parse().map_err(StoreError::backend)?;

        Ok(Order::restore(
            OrderId::new(row.try_get::<String, _>("id").map_err(StoreError::backend)?),
            row.try_get("customer_email").map_err(StoreError::backend)?,
            row.try_get("amount_cents").map_err(StoreError::backend)?,
            status,
            row.try_get::<DateTime<Utc>, _>("created_at")
                .map_err(StoreError::backend)?,
            row.try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(StoreError::backend)?,
        ))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_email, amount_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_str())
        .bind(order.customer_email())
        .bind(order.amount_cents())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return StoreError::Conflict(order.id().clone());
            }
            StoreError::backend(e)
        })?;

        Ok(())
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, StoreError> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, customer_email, amount_cents, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Order>, StoreError> {
        let limit = i64::try_from(filter.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(filter.offset()).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, customer_email, amount_cents, status, created_at, updated_at
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = GREATEST(updated_at, $3)
            WHERE id = $1 AND status = $4
            RETURNING id, customer_email, amount_cents, status, created_at, updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        if let Some(row) = row {
            return Self::row_to_order(row);
        }

        // No row matched: either the order is gone or its status moved on
        let actual = self.get_by_id(id).await?.status();
        Err(StoreError::StatusChanged {
            id: id.clone(),
            actual,
        })
    }
}

/// PostgreSQL-backed idempotency store.
///
/// The primary key on `key` makes concurrent saves race-safe: the first
/// insert wins and later ones are dropped by `ON CONFLICT DO NOTHING`.
#[derive(Clone)]
pub struct PostgresIdempotencyStore {
    pool: PgPool,
}

impl PostgresIdempotencyStore {
    /// Creates a new PostgreSQL idempotency store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyStore for PostgresIdempotencyStore {
    async fn get(&self, key: &IdempotencyKey) -> Result<Option<StoredResponse>, StoreError> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT status_code, body, order_id
            FROM idempotency_keys
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_code: i32 = row.try_get("status_code").map_err(StoreError::backend)?;
        Ok(Some(StoredResponse {
            status_code: u16::try_from(status_code).map_err(StoreError::backend)?,
            body: row.try_get("body").map_err(StoreError::backend)?,
            order_id: OrderId::new(
                row.try_get::<String, _>("order_id")
                    .map_err(StoreError::backend)?,
            ),
        }))
    }

    async fn save(&self, key: &IdempotencyKey, response: &StoredResponse) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (key, status_code, body, order_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key.as_str())
        .bind(i32::from(response.status_code))
        .bind(&response.body)
        .bind(response.order_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(result.rows_affected() == 1)
    }
}
