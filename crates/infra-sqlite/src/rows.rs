// SQLite row representations

use branchguard_core::domain::{LedgerEntry, Order, OrderStatus, Product};
use branchguard_core::error::Result;

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, stock, amount, created_at, updated_at";

pub(crate) const ORDER_COLUMNS: &str = "id, uid, pid, amount, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    description: String,
    stock: i64,
    amount: i64,
    created_at: i64,
    updated_at: i64,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            stock: self.stock,
            amount: self.amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: i64,
    uid: i64,
    pid: i64,
    amount: i64,
    status: i64, // OrderStatus::code()
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    pub(crate) fn into_order(self) -> Result<Order> {
        Ok(Order {
            id: self.id,
            uid: self.uid,
            pid: self.pid,
            amount: self.amount,
            status: OrderStatus::from_code(self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LedgerRow {
    id: i64,
    trans_type: String,
    gid: String,
    branch_id: String,
    op: String,
    created_at: i64,
}

impl LedgerRow {
    pub(crate) fn into_entry(self) -> Result<LedgerEntry> {
        Ok(LedgerEntry {
            id: self.id,
            trans_type: self.trans_type,
            gid: self.gid,
            branch_id: self.branch_id,
            op: self.op.parse()?,
            created_at: self.created_at,
        })
    }
}
