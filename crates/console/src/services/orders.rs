//! Order service.

use tracing::instrument;

use support_desk_core::{Order, OrderId, OrderStatus, PaymentStatus};

use crate::error::AppError;
use crate::query::{Mutation, QueryClient, QueryKey, keys};

use super::Backend;

/// Order operations against the active backend.
pub struct OrderService<'a> {
    backend: &'a Backend,
    queries: &'a QueryClient,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(backend: &'a Backend, queries: &'a QueryClient) -> Self {
        Self { backend, queries }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn list(&self) -> Result<Vec<Order>, AppError> {
        let backend = self.backend;
        self.queries
            .fetch(&keys::orders(), move || backend.orders())
            .await
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the backend call fails.
    pub async fn get(&self, id: OrderId) -> Result<Order, AppError> {
        let backend = self.backend;
        self.queries
            .fetch(&keys::order(id), move || backend.order(id))
            .await
    }

    /// Change an order's fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the backend call fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, AppError> {
        Mutation::new(order_keys())
            .execute(self.queries, self.backend.update_order_status(id, status))
            .await
    }

    /// Change an order's payment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the backend call fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<Order, AppError> {
        Mutation::new(order_keys())
            .execute(self.queries, self.backend.update_payment_status(id, status))
            .await
    }
}

fn order_keys() -> [QueryKey; 2] {
    [keys::orders(), keys::analytics()]
}
