//! Dashboard analytics.

use support_desk_core::DashboardStats;

use crate::error::AppError;
use crate::query::{QueryClient, keys};

use super::Backend;

/// Computes dashboard numbers from the active backend's collections.
pub struct AnalyticsService<'a> {
    backend: &'a Backend,
    queries: &'a QueryClient,
    low_stock_threshold: u32,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub const fn new(backend: &'a Backend, queries: &'a QueryClient, low_stock_threshold: u32) -> Self {
        Self {
            backend,
            queries,
            low_stock_threshold,
        }
    }

    /// Dashboard stats, loading chats, products and orders concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first backend error.
    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        let backend = self.backend;
        let threshold = self.low_stock_threshold;
        self.queries
            .fetch(&keys::analytics(), move || async move {
                let (chats, products, orders) =
                    futures::try_join!(backend.chats(), backend.products(), backend.orders())?;
                Ok::<_, AppError>(DashboardStats::compute(&chats, &products, &orders, threshold))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use support_desk_core::{OrderStatus, Price};

    use super::*;
    use crate::config::{DemoConfig, QueryConfig};
    use crate::demo::DemoDataManager;
    use crate::services::OrderService;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_dashboard_over_seed_data() {
        let demo = DemoDataManager::new(Arc::new(MemoryStore::new()), DemoConfig::default());
        demo.initialize().expect("init");
        let backend: Backend = demo.into();
        let queries = QueryClient::new(QueryConfig::default());

        let stats = AnalyticsService::new(&backend, &queries, 5)
            .dashboard()
            .await
            .expect("stats");

        assert_eq!(stats.chat_count, 3);
        assert_eq!(stats.product_count, 5);
        assert_eq!(stats.ai_enabled_chats, 2);
        assert_eq!(stats.unread_messages, 3);
        // Smart Watch has 3 left; the lamp is unavailable
        assert_eq!(stats.low_stock_products, 1);
        assert!(stats.paid_revenue > Price::ZERO);
    }

    #[tokio::test]
    async fn test_order_mutation_refreshes_dashboard() {
        let demo = DemoDataManager::new(Arc::new(MemoryStore::new()), DemoConfig::default());
        demo.initialize().expect("init");
        let backend: Backend = demo.into();
        let queries = QueryClient::new(QueryConfig::default());
        let analytics = AnalyticsService::new(&backend, &queries, 5);

        let before = analytics.dashboard().await.expect("stats");
        let orders = OrderService::new(&backend, &queries);
        let order = orders.list().await.expect("orders").remove(0);
        orders
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .expect("cancel");

        let after = analytics.dashboard().await.expect("stats");
        assert_eq!(after.orders.cancelled, before.orders.cancelled + 1);
    }
}
