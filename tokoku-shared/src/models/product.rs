/// Product model and database operations
///
/// Every product belongs to one category and one supplier. Both references
/// are enforced by foreign keys with `ON DELETE RESTRICT`, so a category or
/// supplier cannot be removed while products still point at it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
///     category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
///     supplier_id BIGINT NOT NULL REFERENCES suppliers(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tokoku_shared::models::product::{Product, ProductInput};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let product = Product::create(
///     &pool,
///     ProductInput {
///         name: "Green tea".to_string(),
///         description: "500 ml bottle".to_string(),
///         price: 1.25,
///         category_id: 1,
///         supplier_id: 1,
///     },
/// )
/// .await?;
/// println!("Created product {}", product.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Sellable product
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID
    pub id: i64,

    /// Product name
    pub name: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// Unit price
    pub price: f64,

    /// Owning category
    pub category_id: i64,

    /// Supplying vendor
    pub supplier_id: i64,

    /// When the product was created
    pub created_at: DateTime<Utc>,

    /// When the product was last updated
    pub updated_at: DateTime<Utc>,
}

/// Writable product fields, used for both create and full update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
    pub supplier_id: i64,
}

const COLUMNS: &str = "id, name, description, price, category_id, supplier_id, created_at, updated_at";

impl Product {
    /// Inserts a product
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the category or supplier does
    /// not exist.
    pub async fn create(pool: &PgPool, data: ProductInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, description, price, category_id, supplier_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.price)
            .bind(data.category_id)
            .bind(data.supplier_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a product by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM products WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists products ordered by ID
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM products ORDER BY id LIMIT $1 OFFSET $2",
            COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Replaces a product's fields, returning `None` if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: ProductInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, category_id = $5, supplier_id = $6, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.price)
            .bind(data.category_id)
            .bind(data.supplier_id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a product, returning `true` if a row was removed
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
