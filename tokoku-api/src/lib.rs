//! # Tokoku API Server Library
//!
//! HTTP boundary for the Tokoku back-office API.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration management
//! - `error`: public error taxonomy and HTTP response mapping
//! - `extract`: extractors whose rejections use that taxonomy
//! - `middleware`: security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
