// Product Branches - stock decrement and its compensation

use crate::application::barrier::{Barrier, BarrierOutcome, UnitOfWork};
use crate::domain::{BranchCall, ProductId};
use crate::error::{AppError, Result};
use crate::port::{ProductTransaction, TransactionalStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stock branch payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRequest {
    pub id: ProductId,
    pub num: i64,
}

/// Take stock out (forward step)
pub struct DecrStock(pub StockRequest);

#[async_trait]
impl<T: ProductTransaction> UnitOfWork<T> for DecrStock {
    async fn execute(self, tx: &mut T) -> Result<()> {
        let StockRequest { id, num } = self.0;
        let mut product = tx
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;

        product.decrease_stock(num)?;
        tx.update_stock(&product).await
    }
}

/// Put stock back (compensation)
pub struct RestoreStock(pub StockRequest);

#[async_trait]
impl<T: ProductTransaction> UnitOfWork<T> for RestoreStock {
    async fn execute(self, tx: &mut T) -> Result<()> {
        let StockRequest { id, num } = self.0;
        let mut product = tx
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;

        product.increase_stock(num)?;
        tx.update_stock(&product).await
    }
}

/// Product service branch endpoints
pub struct ProductBranches<S> {
    barrier: Barrier<S>,
}

impl<S> ProductBranches<S>
where
    S: TransactionalStore,
    S::Tx: ProductTransaction,
{
    pub fn new(barrier: Barrier<S>) -> Self {
        Self { barrier }
    }

    /// Decrement stock, guarded by the barrier
    pub async fn decr_stock(&self, call: &BranchCall, req: StockRequest) -> Result<BarrierOutcome> {
        call.expect_forward().map_err(|e| AppError::Validation(e.to_string()))?;
        self.barrier.run(call, DecrStock(req)).await
    }

    /// Undo a stock decrement, guarded by the barrier
    pub async fn decr_stock_revert(
        &self,
        call: &BranchCall,
        req: StockRequest,
    ) -> Result<BarrierOutcome> {
        call.expect_rollback().map_err(|e| AppError::Validation(e.to_string()))?;
        self.barrier.run(call, RestoreStock(req)).await
    }
}
