//! RPC Method Handlers
//!
//! Call sites of the barrier: extract the branch call, hand the payload to the
//! participant's branch use case, map the outcome for the coordinator.

use crate::error::to_rpc_error;
use crate::types::{
    BarrierParams, BranchLedgerRequest, BranchLedgerResponse, BranchResponse,
    CreateOrderBranchRequest, CreateProductRequest, CreateProductResponse, OrderDetailRequest,
    OrderDetailResponse, ProductDetailRequest, ProductDetailResponse, RevertOrderBranchRequest,
    StatsRequest, StatsResponse, StockBranchRequest,
};
use branchguard_core::application::{
    Barrier, CreateOrderRequest, OrderBranches, ProductBranches, RevertOrderRequest, StockRequest,
};
use branchguard_core::domain::{BranchCall, Product};
use branchguard_core::error::AppError;
use branchguard_core::port::{
    LedgerReader, OrderRepository, OrderTransaction, ProductRepository, ProductTransaction,
    TransactionalStore, UserDirectory,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// Read-side dependencies of the handler
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub ledger: Arc<dyn LedgerReader>,
}

/// RPC Handler with injected dependencies
pub struct RpcHandler<S> {
    product_branches: ProductBranches<S>,
    order_branches: OrderBranches<S>,
    repos: Repositories,
    start_time: std::time::Instant,
}

fn branch_call(params: &BarrierParams) -> Result<BranchCall, ErrorObjectOwned> {
    params
        .to_call()
        .map_err(|e| to_rpc_error(AppError::Validation(e.to_string())))
}

impl<S> RpcHandler<S>
where
    S: TransactionalStore,
    S::Tx: ProductTransaction + OrderTransaction,
{
    pub fn new(barrier: Barrier<S>, users: Arc<dyn UserDirectory>, repos: Repositories) -> Self {
        Self {
            product_branches: ProductBranches::new(barrier.clone()),
            order_branches: OrderBranches::new(barrier, users),
            repos,
            start_time: std::time::Instant::now(),
        }
    }

    /// product.decr_stock.v1
    pub async fn decr_stock(
        &self,
        params: StockBranchRequest,
    ) -> Result<BranchResponse, ErrorObjectOwned> {
        let call = branch_call(&params.barrier)?;
        let req = StockRequest {
            id: params.id,
            num: params.num,
        };

        let outcome = self
            .product_branches
            .decr_stock(&call, req)
            .await
            .map_err(to_rpc_error)?;

        Ok(BranchResponse::new(&call, outcome))
    }

    /// product.decr_stock_revert.v1
    pub async fn decr_stock_revert(
        &self,
        params: StockBranchRequest,
    ) -> Result<BranchResponse, ErrorObjectOwned> {
        let call = branch_call(&params.barrier)?;
        let req = StockRequest {
            id: params.id,
            num: params.num,
        };

        let outcome = self
            .product_branches
            .decr_stock_revert(&call, req)
            .await
            .map_err(to_rpc_error)?;

        Ok(BranchResponse::new(&call, outcome))
    }

    /// order.create.v1
    pub async fn create_order(
        &self,
        params: CreateOrderBranchRequest,
    ) -> Result<BranchResponse, ErrorObjectOwned> {
        let call = branch_call(&params.barrier)?;
        let req = CreateOrderRequest {
            uid: params.uid,
            pid: params.pid,
            amount: params.amount,
            status: params.status,
        };

        let outcome = self
            .order_branches
            .create(&call, req)
            .await
            .map_err(to_rpc_error)?;

        Ok(BranchResponse::new(&call, outcome))
    }

    /// order.create_revert.v1
    pub async fn create_order_revert(
        &self,
        params: RevertOrderBranchRequest,
    ) -> Result<BranchResponse, ErrorObjectOwned> {
        let call = branch_call(&params.barrier)?;
        let req = RevertOrderRequest { uid: params.uid };

        let outcome = self
            .order_branches
            .create_revert(&call, req)
            .await
            .map_err(to_rpc_error)?;

        Ok(BranchResponse::new(&call, outcome))
    }

    /// product.create.v1
    pub async fn create_product(
        &self,
        params: CreateProductRequest,
    ) -> Result<CreateProductResponse, ErrorObjectOwned> {
        let mut product = Product::new(0, params.name, params.stock, params.amount);
        product.description = params.description;

        let id = self
            .repos
            .products
            .insert(&product)
            .await
            .map_err(to_rpc_error)?;

        Ok(CreateProductResponse { id })
    }

    /// product.detail.v1
    pub async fn product_detail(
        &self,
        params: ProductDetailRequest,
    ) -> Result<ProductDetailResponse, ErrorObjectOwned> {
        let product = self
            .repos
            .products
            .find_by_id(params.id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| to_rpc_error(AppError::NotFound(format!("product {}", params.id))))?;

        Ok(ProductDetailResponse { product })
    }

    /// order.detail.v1
    pub async fn order_detail(
        &self,
        params: OrderDetailRequest,
    ) -> Result<OrderDetailResponse, ErrorObjectOwned> {
        let orders = match (params.id, params.uid) {
            (Some(id), _) => self
                .repos
                .orders
                .find_by_id(id)
                .await
                .map_err(to_rpc_error)?
                .into_iter()
                .collect(),
            (None, Some(uid)) => self
                .repos
                .orders
                .find_by_uid(uid)
                .await
                .map_err(to_rpc_error)?,
            (None, None) => {
                return Err(to_rpc_error(AppError::Validation(
                    "either id or uid is required".to_string(),
                )))
            }
        };

        Ok(OrderDetailResponse { orders })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let ledger = self.repos.ledger.stats().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            ledger,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }

    /// admin.branch.v1
    pub async fn branch_ledger(
        &self,
        params: BranchLedgerRequest,
    ) -> Result<BranchLedgerResponse, ErrorObjectOwned> {
        let entries = self
            .repos
            .ledger
            .find_branch(&params.gid, &params.branch_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(BranchLedgerResponse { entries })
    }
}
