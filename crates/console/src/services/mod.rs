//! Services pairing backend calls with the query cache.
//!
//! Reads are cached under [`keys`](crate::query::keys); writes run as
//! mutations that invalidate the keys they affect.

mod analytics;
mod backend;
mod catalog;
mod chat;
mod orders;

pub use analytics::AnalyticsService;
pub use backend::Backend;
pub use catalog::CatalogService;
pub use chat::{ChatService, SentMessage};
pub use orders::OrderService;
