//! # Tokoku Shared Library
//!
//! Authentication core and persistence layer for the Tokoku back-office
//! API.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens, revocation, Auth Gate
//! - `store`: credential store abstraction and its backends
//! - `models`: database models for users and the catalog
//! - `db`: connection pool and migrations
//! - `redis`: Redis client used by the revocation list

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod store;

/// Current version of the Tokoku shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
