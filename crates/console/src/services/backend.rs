//! Data source selected at startup: the remote API or the local demo store.

use tracing::debug;

use support_desk_core::{
    Chat, ChatId, Message, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, Sender,
    SendMessage,
};

use crate::api::{ApiClient, ChatUpdate, OrderUpdate};
use crate::demo::DemoDataManager;
use crate::error::AppError;

/// Where entities are read from and written to.
///
/// Exactly one backend is active for the lifetime of an
/// [`AppContext`](crate::AppContext); the two are never merged.
#[derive(Clone)]
pub enum Backend {
    Remote(ApiClient),
    Demo(DemoDataManager),
}

impl Backend {
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }

    /// The demo store, when running in demo mode.
    #[must_use]
    pub const fn demo(&self) -> Option<&DemoDataManager> {
        match self {
            Self::Demo(demo) => Some(demo),
            Self::Remote(_) => None,
        }
    }

    // =========================================================================
    // Chats & Messages
    // =========================================================================

    pub(crate) async fn chats(&self) -> Result<Vec<Chat>, AppError> {
        match self {
            Self::Remote(api) => Ok(api.list_chats().await?),
            Self::Demo(demo) => Ok(demo.chats()),
        }
    }

    pub(crate) async fn chat(&self, id: ChatId) -> Result<Chat, AppError> {
        match self {
            Self::Remote(api) => Ok(api.get_chat(id).await?),
            Self::Demo(demo) => demo
                .chat(id)
                .ok_or_else(|| AppError::NotFound(format!("chat {id}"))),
        }
    }

    pub(crate) async fn messages(&self, chat_id: ChatId) -> Result<Vec<Message>, AppError> {
        match self {
            Self::Remote(api) => Ok(api.list_messages(chat_id).await?),
            Self::Demo(demo) => Ok(demo.messages(chat_id)),
        }
    }

    pub(crate) async fn send_message(&self, request: &SendMessage) -> Result<Message, AppError> {
        match self {
            Self::Remote(api) => Ok(api.send_message(request).await?),
            Self::Demo(demo) => Ok(demo.add_message(
                request.chat_id,
                Sender::User,
                &request.content,
                request.product_id,
            )?),
        }
    }

    pub(crate) async fn set_ai_enabled(&self, id: ChatId, enabled: bool) -> Result<Chat, AppError> {
        match self {
            Self::Remote(api) => Ok(api.update_chat(id, &ChatUpdate::ai_enabled(enabled)).await?),
            Self::Demo(demo) => Ok(demo.set_ai_enabled(id, enabled)?),
        }
    }

    pub(crate) async fn mark_read(&self, id: ChatId) -> Result<Chat, AppError> {
        match self {
            Self::Remote(api) => Ok(api.update_chat(id, &ChatUpdate::mark_read()).await?),
            Self::Demo(demo) => Ok(demo.mark_chat_read(id)?),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub(crate) async fn products(&self) -> Result<Vec<Product>, AppError> {
        match self {
            Self::Remote(api) => Ok(api.list_products().await?),
            Self::Demo(demo) => Ok(demo.products()),
        }
    }

    pub(crate) async fn create_product(&self, product: Product) -> Result<Product, AppError> {
        match self {
            Self::Remote(api) => Ok(api.create_product(&product).await?),
            Self::Demo(demo) => {
                demo.save_product(product.clone())?;
                Ok(product)
            }
        }
    }

    pub(crate) async fn update_product(&self, product: Product) -> Result<Product, AppError> {
        match self {
            Self::Remote(api) => Ok(api.update_product(&product).await?),
            Self::Demo(demo) => {
                if demo.product(product.id).is_none() {
                    return Err(AppError::NotFound(format!("product {}", product.id)));
                }
                demo.save_product(product.clone())?;
                Ok(product)
            }
        }
    }

    /// Returns whether the product existed.
    pub(crate) async fn delete_product(&self, id: ProductId) -> Result<bool, AppError> {
        match self {
            Self::Remote(api) => match api.delete_product(id).await {
                Ok(()) => Ok(true),
                Err(e) if e.is_not_found() => {
                    debug!(product_id = %id, "Product already deleted");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            },
            Self::Demo(demo) => Ok(demo.delete_product(id)?),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub(crate) async fn orders(&self) -> Result<Vec<Order>, AppError> {
        match self {
            Self::Remote(api) => Ok(api.list_orders().await?),
            Self::Demo(demo) => Ok(demo.orders()),
        }
    }

    pub(crate) async fn order(&self, id: OrderId) -> Result<Order, AppError> {
        match self {
            Self::Remote(api) => Ok(api.get_order(id).await?),
            Self::Demo(demo) => demo
                .order(id)
                .ok_or_else(|| AppError::NotFound(format!("order {id}"))),
        }
    }

    pub(crate) async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        match self {
            Self::Remote(api) => {
                let update = OrderUpdate {
                    status: Some(status),
                    payment_status: None,
                };
                Ok(api.update_order(id, &update).await?)
            }
            Self::Demo(demo) => Ok(demo.update_order_status(id, status)?),
        }
    }

    pub(crate) async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, AppError> {
        match self {
            Self::Remote(api) => {
                let update = OrderUpdate {
                    status: None,
                    payment_status: Some(status),
                };
                Ok(api.update_order(id, &update).await?)
            }
            Self::Demo(demo) => Ok(demo.update_payment_status(id, status)?),
        }
    }
}

impl From<DemoDataManager> for Backend {
    fn from(demo: DemoDataManager) -> Self {
        Self::Demo(demo)
    }
}

impl From<ApiClient> for Backend {
    fn from(api: ApiClient) -> Self {
        Self::Remote(api)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::DemoConfig;
    use crate::store::MemoryStore;

    fn demo_backend() -> Backend {
        let demo = DemoDataManager::new(Arc::new(MemoryStore::new()), DemoConfig::default());
        demo.initialize().expect("init");
        demo.into()
    }

    #[tokio::test]
    async fn test_demo_lookup_missing_chat() {
        let backend = demo_backend();
        let result = backend.chat(ChatId::generate()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_demo_update_requires_existing_product() {
        let backend = demo_backend();
        let product = Product::new("Ghost", support_desk_core::Price::ZERO, "Misc");
        assert!(backend.update_product(product.clone()).await.is_err());

        backend.create_product(product.clone()).await.expect("create");
        let renamed = Product {
            name: "Ghost v2".to_string(),
            ..product
        };
        let saved = backend.update_product(renamed.clone()).await.expect("update");
        assert_eq!(saved, renamed);
    }

    #[tokio::test]
    async fn test_demo_send_message_is_from_user() {
        let backend = demo_backend();
        let chat = backend.chats().await.expect("chats").remove(0);
        let message = backend
            .send_message(&SendMessage {
                chat_id: chat.id,
                content: "hello".to_string(),
                product_id: None,
            })
            .await
            .expect("send");
        assert_eq!(message.sender, Sender::User);
    }

    #[test]
    fn test_demo_accessor() {
        assert!(demo_backend().is_demo());
        assert!(demo_backend().demo().is_some());
    }
}
