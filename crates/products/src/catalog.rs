//! Storage port for catalog products.

use std::sync::Arc;

use stockroom_core::{DomainResult, ProductId};

use crate::product::Product;

/// Catalog storage collaborator.
///
/// Implementations own persistence; the engine only reads through `get_product`.
pub trait ProductCatalog: Send + Sync {
    fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>>;
    /// Insert a new product; an existing id is a `Conflict`.
    fn insert_product(&self, product: Product) -> DomainResult<()>;
    /// Replace an existing product; a missing id is `NotFound`.
    fn update_product(&self, product: Product) -> DomainResult<()>;
    /// Returns `false` when the id was unknown.
    fn delete_product(&self, id: ProductId) -> DomainResult<bool>;
    /// All products in insertion order.
    fn list_products(&self) -> DomainResult<Vec<Product>>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        (**self).get_product(id)
    }

    fn insert_product(&self, product: Product) -> DomainResult<()> {
        (**self).insert_product(product)
    }

    fn update_product(&self, product: Product) -> DomainResult<()> {
        (**self).update_product(product)
    }

    fn delete_product(&self, id: ProductId) -> DomainResult<bool> {
        (**self).delete_product(id)
    }

    fn list_products(&self) -> DomainResult<Vec<Product>> {
        (**self).list_products()
    }
}
