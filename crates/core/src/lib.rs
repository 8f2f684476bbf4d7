//! Support Desk Core - Shared domain types.
//!
//! This crate provides the types shared by every Support Desk component:
//! - `support-desk` - Console data layer (demo store, API client, query cache)
//! - `support-desk-cli` - Operator command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and status enums
//! - [`models`] - Chats, messages, products, orders and dashboard stats

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
