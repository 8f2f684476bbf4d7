//! Product catalog model.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product in the catalog.
///
/// `price` is a [`Price`] and `quantity` is unsigned, so neither can go
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: Price,
    pub category: String,
    /// Whether the product can currently be ordered.
    pub available: bool,
    #[serde(default)]
    pub quantity: u32,
}

impl Product {
    /// Create a new available product with a fresh ID.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price, category: impl Into<String>) -> Self {
        Self {
            id: ProductId::generate(),
            name: name.into(),
            image_url: None,
            price,
            category: category.into(),
            available: true,
            quantity: 0,
        }
    }

    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Whether the product is available and has stock left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.available && self.quantity > 0
    }
}
