//! Chat and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, CustomerId, MessageId, ProductId, Sender};

/// A customer conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique chat ID.
    pub id: ChatId,
    /// Display name shown in the chat list.
    pub name: String,
    /// Whether the AI assistant answers inbound messages.
    pub ai_enabled: bool,
    /// Inbound messages not yet read by an operator.
    #[serde(default)]
    pub unread_count: u32,
    /// Linked customer record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// When the chat was created.
    pub created_at: DateTime<Utc>,
    /// Time of the last activity (message or toggle).
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new, empty chat.
    #[must_use]
    pub fn new(name: impl Into<String>, ai_enabled: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: ChatId::generate(),
            name: name.into(),
            ai_enabled,
            unread_count: 0,
            customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message inside a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// Chat this message belongs to.
    pub chat_id: ChatId,
    /// Message text.
    pub content: String,
    /// Author of the message.
    pub sender: Sender,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
    /// Product attached to the message (e.g. an assistant recommendation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

impl Message {
    /// Create a new message in `chat_id`.
    #[must_use]
    pub fn new(
        chat_id: ChatId,
        sender: Sender,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            chat_id,
            content: content.into(),
            sender,
            created_at: now,
            product_id: None,
        }
    }

    /// Attach a product reference.
    #[must_use]
    pub const fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

/// Request body for `POST /messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    /// Target chat.
    pub chat_id: ChatId,
    /// Message text.
    pub content: String,
    /// Optional attached product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}
