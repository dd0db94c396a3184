//! RPC Request/Response Types

use branchguard_core::application::BarrierOutcome;
use branchguard_core::domain::{BranchCall, BranchOp, DomainError, LedgerEntry, Order, Product};
use branchguard_core::port::LedgerStats;
use serde::{Deserialize, Serialize};

/// Barrier metadata sent by the coordinator with every branch call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BarrierParams {
    #[serde(default = "default_trans_type")]
    pub trans_type: String,
    pub gid: String,
    pub branch_id: String,
    pub op: String,
}

fn default_trans_type() -> String {
    "saga".to_string()
}

impl BarrierParams {
    /// Validated branch call
    pub fn to_call(&self) -> Result<BranchCall, DomainError> {
        let op: BranchOp = self.op.parse()?;
        BranchCall::new(&self.trans_type, &self.gid, &self.branch_id, op)
    }
}

/// product.decr_stock.v1 / product.decr_stock_revert.v1
#[derive(Debug, Deserialize)]
pub struct StockBranchRequest {
    pub barrier: BarrierParams,
    pub id: i64,
    pub num: i64,
}

/// order.create.v1
#[derive(Debug, Deserialize)]
pub struct CreateOrderBranchRequest {
    pub barrier: BarrierParams,
    pub uid: i64,
    pub pid: i64,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: Option<i64>,
}

/// order.create_revert.v1
#[derive(Debug, Deserialize)]
pub struct RevertOrderBranchRequest {
    pub barrier: BarrierParams,
    pub uid: i64,
}

/// Result of any branch method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchResponse {
    pub gid: String,
    pub branch_id: String,
    pub op: String,
    pub outcome: String,
    pub applied: bool,
}

impl BranchResponse {
    pub fn new(call: &BranchCall, outcome: BarrierOutcome) -> Self {
        Self {
            gid: call.gid.clone(),
            branch_id: call.branch_id.clone(),
            op: call.op.to_string(),
            outcome: outcome.to_string(),
            applied: outcome.applied(),
        }
    }
}

/// product.create.v1
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stock: i64,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductResponse {
    pub id: i64,
}

/// product.detail.v1
#[derive(Debug, Deserialize)]
pub struct ProductDetailRequest {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailResponse {
    pub product: Product,
}

/// order.detail.v1 (by order id, or every order of a user)
#[derive(Debug, Deserialize)]
pub struct OrderDetailRequest {
    pub id: Option<i64>,
    pub uid: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    pub orders: Vec<Order>,
}

/// admin.stats.v1
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub ledger: LedgerStats,
    pub uptime_seconds: i64,
}

/// admin.branch.v1
#[derive(Debug, Deserialize)]
pub struct BranchLedgerRequest {
    pub gid: String,
    pub branch_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchLedgerResponse {
    pub entries: Vec<LedgerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_barrier_params_default_trans_type() {
        let req: StockBranchRequest = serde_json::from_value(json!({
            "barrier": {"gid": "g1", "branch_id": "01", "op": "action"},
            "id": 1,
            "num": 3
        }))
        .unwrap();

        let call = req.barrier.to_call().unwrap();
        assert_eq!(call.trans_type, "saga");
        assert_eq!(call.op, BranchOp::Action);
    }

    #[test]
    fn test_barrier_params_reject_empty_op() {
        let params = BarrierParams {
            trans_type: "saga".to_string(),
            gid: "g1".to_string(),
            branch_id: "01".to_string(),
            op: String::new(),
        };
        assert!(params.to_call().is_err());
    }
}
