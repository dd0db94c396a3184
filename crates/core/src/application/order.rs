// Order Branches - order creation and its compensation

use crate::application::barrier::{Barrier, BarrierOutcome, UnitOfWork};
use crate::domain::{BranchCall, Order, OrderStatus};
use crate::error::{AppError, Result};
use crate::port::{OrderTransaction, TransactionalStore, UserDirectory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Order creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub uid: i64,
    pub pid: i64,
    pub amount: i64,
    /// Initial status code, `Created` when absent
    #[serde(default)]
    pub status: Option<i64>,
}

/// Order revert payload (the user's latest order is reverted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertOrderRequest {
    pub uid: i64,
}

async fn ensure_user(users: &dyn UserDirectory, uid: i64) -> Result<()> {
    if !users.user_exists(uid).await? {
        return Err(AppError::NotFound(format!("user {}", uid)));
    }
    Ok(())
}

/// Insert the order (forward step)
pub struct CreateOrder {
    pub req: CreateOrderRequest,
    pub users: Arc<dyn UserDirectory>,
}

#[async_trait]
impl<T: OrderTransaction> UnitOfWork<T> for CreateOrder {
    async fn execute(self, tx: &mut T) -> Result<()> {
        ensure_user(self.users.as_ref(), self.req.uid).await?;

        if self.req.amount < 0 {
            return Err(AppError::Validation(format!(
                "order amount must not be negative: {}",
                self.req.amount
            )));
        }

        let mut order = Order::new(self.req.uid, self.req.pid, self.req.amount);
        if let Some(code) = self.req.status {
            order.status = OrderStatus::from_code(code)?;
        }
        let order_id = tx.insert_order(&order).await?;
        tracing::debug!(order_id, uid = self.req.uid, "Order created");
        Ok(())
    }
}

/// Flip the user's latest order to `Reverted` (compensation)
pub struct RevertOrder {
    pub req: RevertOrderRequest,
    pub users: Arc<dyn UserDirectory>,
}

#[async_trait]
impl<T: OrderTransaction> UnitOfWork<T> for RevertOrder {
    async fn execute(self, tx: &mut T) -> Result<()> {
        let uid = self.req.uid;
        ensure_user(self.users.as_ref(), uid).await?;

        // Orders carry no gid: this is the user's newest order, which a later
        // saga for the same user may have created after this one.
        let mut order = tx
            .find_latest_order_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order of user {}", uid)))?;

        // Completed orders are settled outside the saga; the compensation
        // still commits so the coordinator can finish rolling back.
        if order.status == OrderStatus::Completed {
            warn!(order_id = order.id, uid, "Completed order left as is");
            return Ok(());
        }

        order.revert()?;
        tx.update_order_status(&order).await
    }
}

/// Order service branch endpoints
pub struct OrderBranches<S> {
    barrier: Barrier<S>,
    users: Arc<dyn UserDirectory>,
}

impl<S> OrderBranches<S>
where
    S: TransactionalStore,
    S::Tx: OrderTransaction,
{
    pub fn new(barrier: Barrier<S>, users: Arc<dyn UserDirectory>) -> Self {
        Self { barrier, users }
    }

    /// Create an order, guarded by the barrier
    pub async fn create(&self, call: &BranchCall, req: CreateOrderRequest) -> Result<BarrierOutcome> {
        call.expect_forward().map_err(|e| AppError::Validation(e.to_string()))?;
        let work = CreateOrder {
            req,
            users: self.users.clone(),
        };
        self.barrier.run(call, work).await
    }

    /// Revert the user's order, guarded by the barrier
    pub async fn create_revert(
        &self,
        call: &BranchCall,
        req: RevertOrderRequest,
    ) -> Result<BarrierOutcome> {
        call.expect_rollback().map_err(|e| AppError::Validation(e.to_string()))?;
        let work = RevertOrder {
            req,
            users: self.users.clone(),
        };
        self.barrier.run(call, work).await
    }
}
