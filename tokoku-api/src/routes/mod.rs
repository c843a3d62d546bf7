/// API route handlers
///
/// - `health`: health check and welcome text
/// - `auth`: register, login, logout and the identity endpoints
/// - `categories`, `suppliers`, `products`, `orders`: catalog CRUD

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod suppliers;

use serde::Deserialize;

/// Largest page a list endpoint returns
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?limit=&offset=` for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    /// Limit clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
