// SQLite Branch Transaction
//
// One local transaction carrying the ledger row and the participant's
// business writes.

use crate::error::map_sqlx_error;
use crate::rows::{OrderRow, ProductRow, ORDER_COLUMNS, PRODUCT_COLUMNS};
use async_trait::async_trait;
use branchguard_core::domain::{BranchCall, BranchOp, Order, OrderId, Product, ProductId};
use branchguard_core::error::{AppError, Result};
use branchguard_core::port::{
    LedgerTransaction, OrderTransaction, ProductTransaction, TimeProvider, Transaction,
};
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use std::sync::Arc;

pub struct SqliteBranchTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteBranchTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { tx, time_provider }
    }
}

#[async_trait]
impl Transaction for SqliteBranchTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl LedgerTransaction for SqliteBranchTransaction {
    async fn try_record(&mut self, call: &BranchCall) -> Result<bool> {
        let now = self.time_provider.now_millis();

        // OR IGNORE: a unique-key hit leaves rows_affected at 0
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO barrier (trans_type, gid, branch_id, op, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&call.trans_type)
        .bind(&call.gid)
        .bind(&call.branch_id)
        .bind(call.op.as_str())
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn exists(&mut self, gid: &str, branch_id: &str, op: &BranchOp) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM barrier WHERE gid = ? AND branch_id = ? AND op = ? LIMIT 1",
        )
        .bind(gid)
        .bind(branch_id)
        .bind(op.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(found.is_some())
    }
}

#[async_trait]
impl ProductTransaction for SqliteBranchTransaction {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRow::into_product))
    }

    async fn update_stock(&mut self, product: &Product) -> Result<()> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(product.stock)
            .bind(now)
            .bind(product.id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("product {}", product.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderTransaction for SqliteBranchTransaction {
    async fn insert_order(&mut self, order: &Order) -> Result<OrderId> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO orders (uid, pid, amount, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.uid)
        .bind(order.pid)
        .bind(order.amount)
        .bind(order.status.code())
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn find_latest_order_by_uid(&mut self, uid: i64) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE uid = ? ORDER BY created_at DESC, id DESC LIMIT 1",
            ORDER_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn update_order_status(&mut self, order: &Order) -> Result<()> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(order.status.code())
            .bind(now)
            .bind(order.id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }
}
