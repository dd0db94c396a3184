// Product Repository Port (Interface)

use crate::domain::{Product, ProductId};
use crate::error::Result;
use crate::port::Transaction;
use async_trait::async_trait;

/// Product reads and writes inside a branch transaction
#[async_trait]
pub trait ProductTransaction: Transaction {
    /// Find product by ID (within transaction)
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Persist the product's stock (within transaction)
    async fn update_stock(&mut self, product: &Product) -> Result<()>;
}

/// Repository interface for Product persistence outside branches
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product, returning its ID
    async fn insert(&self, product: &Product) -> Result<ProductId>;

    /// Find product by ID
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;
}
