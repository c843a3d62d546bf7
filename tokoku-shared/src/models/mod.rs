/// Database models for Tokoku
///
/// Each model maps one table and exposes its CRUD operations as associated
/// functions taking a `&PgPool`.
///
/// # Models
///
/// - `user`: stored credentials (username + password hash)
/// - `category`: product categories
/// - `supplier`: product suppliers
/// - `product`: products, referencing a category and a supplier
/// - `order`: orders, referencing a product

pub mod category;
pub mod order;
pub mod product;
pub mod supplier;
pub mod user;
