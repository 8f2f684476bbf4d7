//! Support Desk console data layer.
//!
//! Everything the console's views need below the presentation layer:
//!
//! - [`api`] - HTTP client for the hosted backend (auth, retries, typed errors)
//! - [`demo`] - local demo store used when no backend is available
//! - [`query`] - cached reads and invalidating writes
//! - [`services`] - chat, catalog, order and analytics operations
//!
//! An [`AppContext`] is built once from a [`ConsoleConfig`] and selects
//! exactly one backend for its lifetime.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod context;
pub mod demo;
pub mod error;
pub mod query;
pub mod services;
pub mod store;

pub use config::ConsoleConfig;
pub use context::AppContext;
pub use error::AppError;
