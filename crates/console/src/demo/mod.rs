//! Demo-mode data layer.
//!
//! When no backend is reachable the console runs against a local persisted
//! store holding chats, messages, products and orders. [`DemoDataManager`]
//! is the only writer of that store.
//!
//! # Failure semantics
//!
//! - Malformed persisted data is treated as an empty collection and logged.
//! - [`DemoDataManager::import`] validates its input and fails without
//!   touching the store when the input is malformed.
//!
//! # Storage keys
//!
//! - `demo_chats`, `demo_messages`, `demo_products`, `demo_orders` - JSON arrays
//! - `demo_mode` - `true` once the store has been initialized

mod assistant;
mod seed;
mod snapshot;

pub use assistant::{AssistantSimulator, Reply, compose_reply};
pub use seed::seed_snapshot;
pub use snapshot::{DemoSnapshot, SNAPSHOT_VERSION, ValidationReport, parse_snapshot};

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, instrument, warn};

use support_desk_core::{
    Chat, ChatId, Message, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, Sender,
};

use crate::config::DemoConfig;
use crate::store::{KeyValueStore, StoreError};

pub const KEY_CHATS: &str = "demo_chats";
pub const KEY_MESSAGES: &str = "demo_messages";
pub const KEY_PRODUCTS: &str = "demo_products";
pub const KEY_ORDERS: &str = "demo_orders";
pub const KEY_DEMO_MODE: &str = "demo_mode";

/// Errors that can occur in the demo data layer.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The underlying store failed.
    #[error("demo store error: {0}")]
    Store(#[from] StoreError),

    /// Data could not be serialized for storage.
    #[error("demo serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Input was rejected by validation.
    #[error(transparent)]
    Validation(#[from] ValidationReport),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Reads and writes demo entities in a [`KeyValueStore`].
///
/// Cheap to clone; clones share the same store and write lock.
#[derive(Clone)]
pub struct DemoDataManager {
    inner: Arc<DemoDataManagerInner>,
}

struct DemoDataManagerInner {
    store: Arc<dyn KeyValueStore>,
    config: DemoConfig,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl DemoDataManager {
    /// Create a manager over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: DemoConfig) -> Self {
        Self {
            inner: Arc::new(DemoDataManagerInner {
                store,
                config,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Whether demo mode is enabled in the configuration this manager was built with.
    #[must_use]
    pub fn is_demo_mode_enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// The demo configuration.
    #[must_use]
    pub fn config(&self) -> &DemoConfig {
        &self.inner.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Seed the store if it holds no demo data.
    ///
    /// Returns `true` if seed data was written. Calling this again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed data cannot be written.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<bool, DemoError> {
        let _guard = self.lock();
        if !self.snapshot().is_empty() {
            return Ok(false);
        }
        self.write_snapshot(&seed_snapshot(Utc::now()))?;
        info!("Seeded demo store");
        Ok(true)
    }

    /// Replace all demo data with fresh seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed data cannot be written.
    #[instrument(skip(self))]
    pub fn reset(&self) -> Result<(), DemoError> {
        let _guard = self.lock();
        self.write_snapshot(&seed_snapshot(Utc::now()))?;
        info!("Reset demo store");
        Ok(())
    }

    /// Current contents of the store.
    #[must_use]
    pub fn snapshot(&self) -> DemoSnapshot {
        DemoSnapshot {
            version: SNAPSHOT_VERSION,
            demo_mode: self.read_flag(KEY_DEMO_MODE),
            chats: self.read_collection(KEY_CHATS),
            messages: self.read_collection(KEY_MESSAGES),
            products: self.read_collection(KEY_PRODUCTS),
            orders: self.read_collection(KEY_ORDERS),
        }
    }

    /// Serialize the whole store to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export(&self) -> Result<String, DemoError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Replace the whole store with an exported document.
    ///
    /// The input is parsed and validated first; on any problem the store is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::Validation` for malformed input, or a store error
    /// if writing fails.
    #[instrument(skip(self, json), fields(bytes = json.len()))]
    pub fn import(&self, json: &str) -> Result<(), DemoError> {
        let snapshot = match parse_snapshot(json) {
            Ok(snapshot) => snapshot,
            Err(report) => {
                warn!(error = %report, "Rejected demo import");
                return Err(report.into());
            }
        };

        let _guard = self.lock();
        self.write_snapshot(&snapshot)?;
        info!(
            chats = snapshot.chats.len(),
            messages = snapshot.messages.len(),
            products = snapshot.products.len(),
            orders = snapshot.orders.len(),
            "Imported demo data"
        );
        Ok(())
    }

    // =========================================================================
    // Chats & Messages
    // =========================================================================

    /// All chats, most recently active first.
    #[must_use]
    pub fn chats(&self) -> Vec<Chat> {
        let mut chats: Vec<Chat> = self.read_collection(KEY_CHATS);
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        chats
    }

    /// A single chat.
    #[must_use]
    pub fn chat(&self, id: ChatId) -> Option<Chat> {
        self.read_collection::<Chat>(KEY_CHATS)
            .into_iter()
            .find(|c| c.id == id)
    }

    /// Turn the AI assistant on or off for a chat.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::NotFound` if the chat does not exist.
    pub fn set_ai_enabled(&self, id: ChatId, enabled: bool) -> Result<Chat, DemoError> {
        self.update_chat(id, |chat| chat.ai_enabled = enabled)
    }

    /// Reset a chat's unread counter.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::NotFound` if the chat does not exist.
    pub fn mark_chat_read(&self, id: ChatId) -> Result<Chat, DemoError> {
        self.update_chat(id, |chat| chat.unread_count = 0)
    }

    /// Messages of a chat, oldest first.
    #[must_use]
    pub fn messages(&self, chat_id: ChatId) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .read_collection::<Message>(KEY_MESSAGES)
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    /// Append a message to a chat.
    ///
    /// Bumps the chat's activity time; a `USER` message also increments its
    /// unread counter.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::NotFound` if the chat does not exist.
    #[instrument(skip(self, content), fields(chat_id = %chat_id, sender = %sender))]
    pub fn add_message(
        &self,
        chat_id: ChatId,
        sender: Sender,
        content: &str,
        product_id: Option<ProductId>,
    ) -> Result<Message, DemoError> {
        let _guard = self.lock();

        let mut chats: Vec<Chat> = self.read_collection(KEY_CHATS);
        let chat = chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or_else(|| DemoError::NotFound(format!("chat {chat_id}")))?;

        let mut message = Message::new(chat_id, sender, content, Utc::now());
        message.product_id = product_id;

        chat.updated_at = message.created_at;
        if sender == Sender::User {
            chat.unread_count = chat.unread_count.saturating_add(1);
        }

        let mut messages: Vec<Message> = self.read_collection(KEY_MESSAGES);
        messages.push(message.clone());

        self.inner.store.set_many(&[
            (KEY_MESSAGES, serde_json::to_string(&messages)?),
            (KEY_CHATS, serde_json::to_string(&chats)?),
        ])?;
        Ok(message)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products in stored order.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.read_collection(KEY_PRODUCTS)
    }

    /// A single product.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products().into_iter().find(|p| p.id == id)
    }

    /// Insert `product`, or replace the stored product with the same ID.
    ///
    /// Returns the full updated collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn save_product(&self, product: Product) -> Result<Vec<Product>, DemoError> {
        let _guard = self.lock();
        let mut products = self.products();
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        self.write_collection(KEY_PRODUCTS, &products)?;
        Ok(products)
    }

    /// Remove a product. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    #[instrument(skip(self))]
    pub fn delete_product(&self, id: ProductId) -> Result<bool, DemoError> {
        let _guard = self.lock();
        let mut products = self.products();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        self.write_collection(KEY_PRODUCTS, &products)?;
        Ok(true)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// All orders, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.read_collection(KEY_ORDERS);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// A single order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.read_collection::<Order>(KEY_ORDERS)
            .into_iter()
            .find(|o| o.id == id)
    }

    /// Insert or replace an order after checking its total.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::Validation` if the order's total does not match
    /// its items.
    pub fn save_order(&self, order: Order) -> Result<Order, DemoError> {
        order
            .validate()
            .map_err(|e| ValidationReport::single(e.to_string()))?;

        let _guard = self.lock();
        let mut orders: Vec<Order> = self.read_collection(KEY_ORDERS);
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        self.write_collection(KEY_ORDERS, &orders)?;
        Ok(order)
    }

    /// Change an order's fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::NotFound` if the order does not exist.
    pub fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, DemoError> {
        self.update_order(id, |order| order.status = status)
    }

    /// Change an order's payment status.
    ///
    /// # Errors
    ///
    /// Returns `DemoError::NotFound` if the order does not exist.
    pub fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, DemoError> {
        self.update_order(id, |order| order.payment_status = status)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update_chat<F>(&self, id: ChatId, update: F) -> Result<Chat, DemoError>
    where
        F: FnOnce(&mut Chat),
    {
        let _guard = self.lock();
        let mut chats: Vec<Chat> = self.read_collection(KEY_CHATS);
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DemoError::NotFound(format!("chat {id}")))?;
        update(chat);
        let updated = chat.clone();
        self.write_collection(KEY_CHATS, &chats)?;
        Ok(updated)
    }

    fn update_order<F>(&self, id: OrderId, update: F) -> Result<Order, DemoError>
    where
        F: FnOnce(&mut Order),
    {
        let _guard = self.lock();
        let mut orders: Vec<Order> = self.read_collection(KEY_ORDERS);
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| DemoError::NotFound(format!("order {id}")))?;
        update(order);
        let updated = order.clone();
        self.write_collection(KEY_ORDERS, &orders)?;
        Ok(updated)
    }

    /// Read a JSON array; anything unreadable counts as empty.
    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.inner.store.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "Malformed demo data, treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read demo data, treating as empty");
                Vec::new()
            }
        }
    }

    fn read_flag(&self, key: &str) -> bool {
        matches!(self.inner.store.get(key), Ok(Some(raw)) if raw.trim() == "true")
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), DemoError> {
        self.inner.store.set(key, &serde_json::to_string(items)?)?;
        Ok(())
    }

    fn write_snapshot(&self, snapshot: &DemoSnapshot) -> Result<(), DemoError> {
        self.inner.store.set_many(&[
            (KEY_CHATS, serde_json::to_string(&snapshot.chats)?),
            (KEY_MESSAGES, serde_json::to_string(&snapshot.messages)?),
            (KEY_PRODUCTS, serde_json::to_string(&snapshot.products)?),
            (KEY_ORDERS, serde_json::to_string(&snapshot.orders)?),
            (KEY_DEMO_MODE, snapshot.demo_mode.to_string()),
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use support_desk_core::Price;

    fn manager() -> (Arc<MemoryStore>, DemoDataManager) {
        let store = Arc::new(MemoryStore::new());
        let config = DemoConfig {
            enabled: true,
            ..DemoConfig::default()
        };
        let manager = DemoDataManager::new(store.clone(), config);
        (store, manager)
    }

    #[test]
    fn test_demo_mode_follows_config() {
        let (_, manager) = manager();
        assert!(manager.is_demo_mode_enabled());

        let disabled = DemoDataManager::new(Arc::new(MemoryStore::new()), DemoConfig::default());
        assert!(!disabled.is_demo_mode_enabled());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_, manager) = manager();
        assert!(manager.initialize().expect("first"));
        let once = manager.snapshot();

        assert!(!manager.initialize().expect("second"));
        assert_eq!(manager.snapshot(), once);
        assert!(once.demo_mode);
    }

    #[test]
    fn test_malformed_collection_reads_as_empty() {
        let (store, manager) = manager();
        store.set(KEY_PRODUCTS, "{not json").expect("set");
        assert!(manager.products().is_empty());
    }

    #[test]
    fn test_initialize_does_not_overwrite_existing_data() {
        let (_, manager) = manager();
        let product = Product::new("Only", Price::from_cents(100), "Misc");
        manager.save_product(product.clone()).expect("save");

        assert!(!manager.initialize().expect("initialize"));
        assert_eq!(manager.products(), vec![product]);
    }

    #[test]
    fn test_save_product_updates_in_place() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let mut product = manager.products().into_iter().next().expect("product");
        product.quantity = 999;

        let products = manager.save_product(product.clone()).expect("save");
        assert_eq!(products.len(), 5);
        assert_eq!(manager.product(product.id).map(|p| p.quantity), Some(999));
    }

    #[test]
    fn test_delete_missing_product_returns_false() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        assert!(!manager.delete_product(ProductId::generate()).expect("delete"));
        assert_eq!(manager.products().len(), 5);
    }

    #[test]
    fn test_add_message_updates_chat() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let chat = manager.chats().pop().expect("chat");

        let message = manager
            .add_message(chat.id, Sender::User, "ping", None)
            .expect("add");

        let updated = manager.chat(chat.id).expect("chat");
        assert_eq!(updated.unread_count, chat.unread_count + 1);
        assert_eq!(updated.updated_at, message.created_at);
        assert_eq!(manager.messages(chat.id).last(), Some(&message));
        // Most recent activity sorts first
        assert_eq!(manager.chats().first().map(|c| c.id), Some(chat.id));
    }

    #[test]
    fn test_bot_message_does_not_count_as_unread() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let chat = manager.chats().remove(0);
        manager
            .add_message(chat.id, Sender::Bot, "auto", None)
            .expect("add");
        assert_eq!(manager.chat(chat.id).map(|c| c.unread_count), Some(chat.unread_count));
    }

    #[test]
    fn test_add_message_to_missing_chat_fails() {
        let (_, manager) = manager();
        let result = manager.add_message(ChatId::generate(), Sender::User, "hi", None);
        assert!(matches!(result, Err(DemoError::NotFound(_))));
        assert!(manager.snapshot().messages.is_empty());
    }

    #[test]
    fn test_messages_sorted_ascending() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        for chat in manager.chats() {
            let messages = manager.messages(chat.id);
            assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
            assert!(messages.iter().all(|m| m.chat_id == chat.id));
        }
    }

    #[test]
    fn test_mark_read_and_toggle_ai() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let chat = manager.chats().remove(0);

        let chat = manager.set_ai_enabled(chat.id, !chat.ai_enabled).expect("toggle");
        assert_eq!(manager.chat(chat.id).map(|c| c.ai_enabled), Some(chat.ai_enabled));

        let chat = manager.mark_chat_read(chat.id).expect("read");
        assert_eq!(chat.unread_count, 0);

        assert!(matches!(
            manager.mark_chat_read(ChatId::generate()),
            Err(DemoError::NotFound(_))
        ));
    }

    #[test]
    fn test_toggle_ai_keeps_chat_order() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let before = manager.chats();
        let last = before.last().expect("chat").clone();

        let toggled = manager
            .set_ai_enabled(last.id, !last.ai_enabled)
            .expect("toggle");
        assert_eq!(toggled.updated_at, last.updated_at);

        let order: Vec<ChatId> = manager.chats().iter().map(|c| c.id).collect();
        let expected: Vec<ChatId> = before.iter().map(|c| c.id).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_order_status_updates() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let order = manager.orders().remove(0);

        let updated = manager
            .update_order_status(order.id, OrderStatus::Cancelled)
            .expect("status");
        assert_eq!(updated.status, OrderStatus::Cancelled);

        let updated = manager
            .update_payment_status(order.id, PaymentStatus::Refunded)
            .expect("payment");
        assert_eq!(manager.order(order.id), Some(updated));
    }

    #[test]
    fn test_save_order_rejects_bad_total() {
        let (_, manager) = manager();
        let mut order = Order::new("X", vec![], Utc::now());
        order.total_amount = Price::from_cents(5);
        assert!(matches!(
            manager.save_order(order),
            Err(DemoError::Validation(_))
        ));
        assert!(manager.orders().is_empty());
    }

    #[test]
    fn test_import_garbage_leaves_store_unchanged() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let before = manager.export().expect("export");

        assert!(matches!(
            manager.import("not json"),
            Err(DemoError::Validation(_))
        ));
        assert_eq!(manager.export().expect("export"), before);
    }

    #[test]
    fn test_import_rejects_overflowing_order_total() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let before = manager.export().expect("export");

        let mut document: serde_json::Value = serde_json::from_str(&before).expect("parse");
        let item = document
            .pointer_mut("/orders/0/items/0")
            .and_then(serde_json::Value::as_object_mut)
            .expect("seeded order item");
        item.insert("price".into(), serde_json::json!("79228162514264337593543950335"));
        item.insert("quantity".into(), serde_json::json!(2));

        let result = manager.import(&document.to_string());
        assert!(matches!(result, Err(DemoError::Validation(_))));
        assert_eq!(manager.export().expect("export"), before);
    }

    #[test]
    fn test_reset_restores_seed() {
        let (_, manager) = manager();
        manager.initialize().expect("init");
        let seeded_ids: Vec<ProductId> = manager.products().iter().map(|p| p.id).collect();

        for id in &seeded_ids {
            manager.delete_product(*id).expect("delete");
        }
        assert!(manager.products().is_empty());

        manager.reset().expect("reset");
        let ids: Vec<ProductId> = manager.products().iter().map(|p| p.id).collect();
        assert_eq!(ids, seeded_ids);
    }
}
