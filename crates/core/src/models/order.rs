//! Order models.
//!
//! An order's `total_amount` must equal the sum of its items'
//! `price * quantity`. [`Order::new`] computes it; orders that arrive from
//! storage or the network are checked with [`Order::validate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Product;
use crate::types::{OrderId, OrderStatus, PaymentStatus, Price, ProductId};

/// Errors raised by order validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Stored total does not match the items.
    #[error("order {order_id}: total {actual} does not match items total {expected}")]
    TotalMismatch {
        order_id: OrderId,
        expected: Price,
        actual: Price,
    },

    /// An item has a quantity of zero.
    #[error("order {order_id}: item '{item}' has zero quantity")]
    ZeroQuantity { order_id: OrderId, item: String },

    /// Item prices and quantities add up to more than a price can hold.
    #[error("order {order_id}: items total overflows")]
    Overflow { order_id: OrderId },
}

/// A line item with a snapshot of the product at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Source product, if it still exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unit price at purchase time.
    pub price: Price,
    pub quantity: u32,
}

impl OrderItem {
    /// Snapshot `product` for an order line.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: Some(product.id),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            price: product.price,
            quantity,
        }
    }

    /// `price * quantity`, saturating on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Price> {
        self.price.checked_times(self.quantity)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order; the total is computed from `items`.
    #[must_use]
    pub fn new(customer_name: impl Into<String>, items: Vec<OrderItem>, now: DateTime<Utc>) -> Self {
        let total_amount = items.iter().map(OrderItem::subtotal).sum();
        Self {
            id: OrderId::generate(),
            customer_name: customer_name.into(),
            status: OrderStatus::New,
            payment_status: PaymentStatus::Pending,
            items,
            total_amount,
            created_at: now,
        }
    }

    /// Sum of item subtotals, saturating on overflow.
    #[must_use]
    pub fn items_total(&self) -> Price {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Sum of item subtotals, or `None` on overflow.
    #[must_use]
    pub fn checked_items_total(&self) -> Option<Price> {
        self.items.iter().try_fold(Price::ZERO, |total, item| {
            total.checked_add(item.checked_subtotal()?)
        })
    }

    /// Check the order's invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), OrderError> {
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(OrderError::ZeroQuantity {
                order_id: self.id,
                item: item.name.clone(),
            });
        }

        let expected = self
            .checked_items_total()
            .ok_or(OrderError::Overflow { order_id: self.id })?;
        if expected != self.total_amount {
            return Err(OrderError::TotalMismatch {
                order_id: self.id,
                expected,
                actual: self.total_amount,
            });
        }
        Ok(())
    }
}
