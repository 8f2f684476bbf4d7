//! Typed wrappers over the backend's REST endpoints.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use support_desk_core::{
    Chat, ChatId, Message, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId,
    SendMessage,
};

use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;

/// Partial update of a chat. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
}

impl ChatUpdate {
    #[must_use]
    pub const fn ai_enabled(enabled: bool) -> Self {
        Self {
            ai_enabled: Some(enabled),
            unread_count: None,
        }
    }

    #[must_use]
    pub const fn mark_read() -> Self {
        Self {
            ai_enabled: None,
            unread_count: Some(0),
        }
    }
}

/// Partial update of an order. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl ApiClient {
    // =========================================================================
    // Chats
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_chats(&self) -> Result<Vec<Chat>, ApiError> {
        self.get("/chats", &RequestOptions::authenticated()).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the chat does not exist.
    #[instrument(skip(self))]
    pub async fn get_chat(&self, id: ChatId) -> Result<Chat, ApiError> {
        self.get(&format!("/chats/{id}"), &RequestOptions::authenticated())
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_chat(&self, id: ChatId, update: &ChatUpdate) -> Result<Chat, ApiError> {
        self.put(&format!("/chats/{id}"), update, &RequestOptions::authenticated())
            .await
    }

    /// Messages of a chat, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>, ApiError> {
        let mut messages: Vec<Message> = self
            .get(&format!("/messages/{chat_id}"), &RequestOptions::authenticated())
            .await?;
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, message), fields(chat_id = %message.chat_id))]
    pub async fn send_message(&self, message: &SendMessage) -> Result<Message, ApiError> {
        self.post("/messages", message, &RequestOptions::authenticated())
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/products", &RequestOptions::authenticated()).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.post("/products", product, &RequestOptions::authenticated())
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.put(
            &format!("/products/{}", product.id),
            product,
            &RequestOptions::authenticated(),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let _: serde::de::IgnoredAny = self
            .delete(&format!("/products/{id}"), &RequestOptions::authenticated())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders, with every total checked against its items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidResponse` if an order's total is inconsistent.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders: Vec<Order> = self.get("/orders", &RequestOptions::authenticated()).await?;
        for order in &orders {
            check_order(order)?;
        }
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the order is inconsistent.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let order: Order = self
            .get(&format!("/orders/{id}"), &RequestOptions::authenticated())
            .await?;
        check_order(&order)?;
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the order is inconsistent.
    #[instrument(skip(self))]
    pub async fn update_order(&self, id: OrderId, update: &OrderUpdate) -> Result<Order, ApiError> {
        let order: Order = self
            .put(&format!("/orders/{id}"), update, &RequestOptions::authenticated())
            .await?;
        check_order(&order)?;
        Ok(order)
    }
}

fn check_order(order: &Order) -> Result<(), ApiError> {
    order
        .validate()
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
