/// Order model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     id BIGSERIAL PRIMARY KEY,
///     product_id BIGINT NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
///     quantity INTEGER NOT NULL CHECK (quantity > 0),
///     total DOUBLE PRECISION NOT NULL CHECK (total >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `total` is taken as given; no pricing is derived from the product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Customer order for a single product line
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID
    pub id: i64,

    /// Ordered product
    pub product_id: i64,

    /// Number of units
    pub quantity: i32,

    /// Order total
    pub total: f64,

    /// When the order was placed
    pub created_at: DateTime<Utc>,

    /// When the order was last updated
    pub updated_at: DateTime<Utc>,
}

/// Writable order fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInput {
    pub product_id: i64,
    pub quantity: i32,
    pub total: f64,
}

impl Order {
    /// Inserts an order; fails with a foreign key violation for an unknown product
    pub async fn create(pool: &PgPool, data: OrderInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (product_id, quantity, total)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, quantity, total, created_at, updated_at
            "#,
        )
        .bind(data.product_id)
        .bind(data.quantity)
        .bind(data.total)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, quantity, total, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, quantity, total, created_at, updated_at
            FROM orders
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: OrderInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET product_id = $2, quantity = $3, total = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, product_id, quantity, total, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.product_id)
        .bind(data.quantity)
        .bind(data.total)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
