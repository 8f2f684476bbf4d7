//! Product catalog service.

use tracing::{info, instrument};

use support_desk_core::{Product, ProductId};

use crate::error::AppError;
use crate::query::{Mutation, QueryClient, QueryKey, keys};

use super::Backend;

/// Product operations against the active backend.
pub struct CatalogService<'a> {
    backend: &'a Backend,
    queries: &'a QueryClient,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(backend: &'a Backend, queries: &'a QueryClient) -> Self {
        Self { backend, queries }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn list(&self) -> Result<Vec<Product>, AppError> {
        let backend = self.backend;
        self.queries
            .fetch(&keys::products(), move || backend.products())
            .await
    }

    /// Add a new product.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, or the backend's error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn create(&self, product: Product) -> Result<Product, AppError> {
        check(&product)?;
        let product = Mutation::new(product_keys())
            .execute(self.queries, self.backend.create_product(product))
            .await?;
        info!(name = %product.name, "Product created");
        Ok(product)
    }

    /// Replace an existing product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist in demo
    /// mode, a validation error for an empty name, or the backend's error.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update(&self, product: Product) -> Result<Product, AppError> {
        check(&product)?;
        Mutation::new(product_keys())
            .execute(self.queries, self.backend.update_product(product))
            .await
    }

    /// Delete a product. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, AppError> {
        Mutation::new(product_keys())
            .execute(self.queries, self.backend.delete_product(id))
            .await
    }
}

fn product_keys() -> [QueryKey; 2] {
    [keys::products(), keys::analytics()]
}

fn check(product: &Product) -> Result<(), AppError> {
    if product.name.trim().is_empty() {
        return Err(AppError::Validation("product name must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use support_desk_core::Price;

    use super::*;
    use crate::config::{DemoConfig, QueryConfig};
    use crate::demo::DemoDataManager;
    use crate::store::MemoryStore;

    fn fixture() -> (Backend, QueryClient) {
        let demo = DemoDataManager::new(Arc::new(MemoryStore::new()), DemoConfig::default());
        demo.initialize().expect("init");
        (demo.into(), QueryClient::new(QueryConfig::default()))
    }

    #[tokio::test]
    async fn test_add_then_delete_leaves_catalog_unchanged() {
        let (backend, queries) = fixture();
        let catalog = CatalogService::new(&backend, &queries);
        let before = catalog.list().await.expect("list");

        let product = Product::new("Travel Mug", Price::from_cents(1_800), "Home").with_quantity(4);
        catalog.create(product.clone()).await.expect("create");
        let during = catalog.list().await.expect("list");
        assert_eq!(during.len(), before.len() + 1);

        assert!(catalog.delete(product.id).await.expect("delete"));
        let after = catalog.list().await.expect("list");
        assert_eq!(after, before);
        assert!(after.iter().all(|p| p.id != product.id));
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let (backend, queries) = fixture();
        let catalog = CatalogService::new(&backend, &queries);
        let product = Product::new("Nope", Price::ZERO, "Misc");
        let err = catalog.update(product).await.expect_err("missing");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (backend, queries) = fixture();
        let catalog = CatalogService::new(&backend, &queries);
        let product = Product::new("  ", Price::ZERO, "Misc");
        assert!(matches!(
            catalog.create(product).await,
            Err(AppError::Validation(_))
        ));
    }
}
