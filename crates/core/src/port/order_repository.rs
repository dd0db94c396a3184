// Order Repository Port (Interface)

use crate::domain::{Order, OrderId};
use crate::error::Result;
use crate::port::Transaction;
use async_trait::async_trait;

/// Order reads and writes inside a branch transaction
#[async_trait]
pub trait OrderTransaction: Transaction {
    /// Insert order (within transaction), returning its ID
    async fn insert_order(&mut self, order: &Order) -> Result<OrderId>;

    /// Most recent order of a user (within transaction)
    async fn find_latest_order_by_uid(&mut self, uid: i64) -> Result<Option<Order>>;

    /// Persist the order's status (within transaction)
    async fn update_order_status(&mut self, order: &Order) -> Result<()>;
}

/// Repository interface for Order reads outside branches
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find order by ID
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// All orders of a user, newest first
    async fn find_by_uid(&self, uid: i64) -> Result<Vec<Order>>;
}
