/// Supplier model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE suppliers (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT suppliers_name_key UNIQUE (name),
///     CONSTRAINT suppliers_email_key UNIQUE (email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Supplier of products
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Supplier {
    /// Unique supplier ID
    pub id: i64,

    /// Supplier name, unique
    pub name: String,

    /// Contact email, unique
    pub email: String,

    /// When the supplier was created
    pub created_at: DateTime<Utc>,

    /// When the supplier was last updated
    pub updated_at: DateTime<Utc>,
}

/// Writable supplier fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInput {
    pub name: String,
    pub email: String,
}

impl Supplier {
    pub async fn create(pool: &PgPool, data: SupplierInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            "SELECT id, name, email, created_at, updated_at FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM suppliers
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Replaces a supplier's fields, returning `None` if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: SupplierInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
