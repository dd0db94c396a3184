// SQLite ProductRepository Implementation

use crate::error::map_sqlx_error;
use crate::rows::{ProductRow, PRODUCT_COLUMNS};
use async_trait::async_trait;
use branchguard_core::domain::{Product, ProductId};
use branchguard_core::error::{AppError, Result};
use branchguard_core::port::{ProductRepository, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteProductRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn insert(&self, product: &Product) -> Result<ProductId> {
        if product.stock < 0 {
            return Err(AppError::Validation(format!(
                "stock must not be negative: {}",
                product.stock
            )));
        }

        let now = self.time_provider.now_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, stock, amount, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.stock)
        .bind(product.amount)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRow::into_product))
    }
}
