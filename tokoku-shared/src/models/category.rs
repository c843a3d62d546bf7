/// Category model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT categories_name_key UNIQUE (name)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tokoku_shared::models::category::{Category, CategoryInput};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let category = Category::create(&pool, CategoryInput { name: "Beverages".to_string() }).await?;
/// let renamed = Category::update(&pool, category.id, CategoryInput { name: "Drinks".to_string() }).await?;
/// assert!(renamed.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID
    pub id: i64,

    /// Display name, unique across categories
    pub name: String,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last updated
    pub updated_at: DateTime<Utc>,
}

/// Writable category fields, used for both create and full update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    /// Display name
    pub name: String,
}

impl Category {
    /// Inserts a category
    ///
    /// # Errors
    ///
    /// Fails with a unique violation (`categories_name_key`) if the name is taken.
    pub async fn create(pool: &PgPool, data: CategoryInput) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Finds a category by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists categories ordered by ID
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM categories
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Replaces a category's fields, returning `None` if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: CategoryInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a category, returning `true` if a row was removed
    ///
    /// Fails with a foreign key violation while products still reference it.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
