//! Domain models shared by the demo store, the API client and the CLI.

pub mod chat;
pub mod order;
pub mod product;
pub mod stats;

pub use chat::{Chat, Message, SendMessage};
pub use order::{Order, OrderError, OrderItem};
pub use product::Product;
pub use stats::{DashboardStats, OrderCounts};
