// SQLite OrderRepository Implementation

use crate::error::map_sqlx_error;
use crate::rows::{OrderRow, ORDER_COLUMNS};
use async_trait::async_trait;
use branchguard_core::domain::{Order, OrderId};
use branchguard_core::error::Result;
use branchguard_core::port::OrderRepository;
use sqlx::SqlitePool;

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = ?",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn find_by_uid(&self, uid: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE uid = ? ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(uid)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
