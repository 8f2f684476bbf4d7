//! Dashboard analytics derived from chats, products and orders.

use serde::{Deserialize, Serialize};

use crate::models::{Chat, Order, Product};
use crate::types::{OrderStatus, PaymentStatus, Price};

/// Number of orders in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCounts {
    pub new: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl OrderCounts {
    fn record(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::New => self.new += 1,
            OrderStatus::Processing => self.processing += 1,
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Summary numbers for the dashboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub chat_count: usize,
    pub unread_messages: u64,
    pub ai_enabled_chats: usize,
    pub product_count: usize,
    /// Available products whose quantity is below the low-stock threshold.
    pub low_stock_products: usize,
    pub orders: OrderCounts,
    /// Sum of totals of paid orders.
    pub paid_revenue: Price,
}

impl DashboardStats {
    /// Compute stats from the current collections.
    #[must_use]
    pub fn compute(
        chats: &[Chat],
        products: &[Product],
        orders: &[Order],
        low_stock_threshold: u32,
    ) -> Self {
        let mut counts = OrderCounts::default();
        for order in orders {
            counts.record(order.status);
        }

        Self {
            chat_count: chats.len(),
            unread_messages: chats.iter().map(|c| u64::from(c.unread_count)).sum(),
            ai_enabled_chats: chats.iter().filter(|c| c.ai_enabled).count(),
            product_count: products.len(),
            low_stock_products: products
                .iter()
                .filter(|p| p.available && p.quantity < low_stock_threshold)
                .count(),
            orders: counts,
            paid_revenue: orders
                .iter()
                .filter(|o| o.payment_status == PaymentStatus::Paid)
                .map(|o| o.total_amount)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::OrderItem;

    #[test]
    fn test_compute_stats() {
        let now = Utc::now();
        let mut busy = Chat::new("Busy", true, now);
        busy.unread_count = 3;
        let quiet = Chat::new("Quiet", false, now);

        let tea = Product::new("Tea", Price::from_cents(500), "Drinks").with_quantity(2);
        let mug = Product::new("Mug", Price::from_cents(1000), "Kitchen").with_quantity(50);

        let mut paid = Order::new("A", vec![OrderItem::from_product(&mug, 2)], now);
        paid.payment_status = PaymentStatus::Paid;
        paid.status = OrderStatus::Completed;
        let pending = Order::new("B", vec![OrderItem::from_product(&tea, 1)], now);

        let stats = DashboardStats::compute(&[busy, quiet], &[tea, mug], &[paid, pending], 5);

        assert_eq!(stats.chat_count, 2);
        assert_eq!(stats.unread_messages, 3);
        assert_eq!(stats.ai_enabled_chats, 1);
        assert_eq!(stats.low_stock_products, 1);
        assert_eq!(stats.orders.completed, 1);
        assert_eq!(stats.orders.new, 1);
        assert_eq!(stats.paid_revenue, Price::from_cents(2000));
    }

    #[test]
    fn test_compute_empty() {
        let stats = DashboardStats::compute(&[], &[], &[], 5);
        assert_eq!(stats.chat_count, 0);
        assert_eq!(stats.paid_revenue, Price::ZERO);
    }
}
