//! Barrier Property Tests
//!
//! Duplicate delivery, null compensation, dangling execution and rollback
//! against a real SQLite file, so concurrent calls use separate connections.

use branchguard_core::application::{Barrier, BarrierOutcome, ProductBranches, StockRequest};
use branchguard_core::domain::{BranchCall, BranchOp, Product};
use branchguard_core::port::time_provider::SystemTimeProvider;
use branchguard_core::port::{LedgerReader, LedgerTransaction, ProductRepository, TransactionalStore};
use branchguard_infra_sqlite::{create_pool, run_migrations, SqliteProductRepository, SqliteStore};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    store: Arc<SqliteStore>,
    products: SqliteProductRepository,
    branches: Arc<ProductBranches<SqliteStore>>,
}

async fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("participant.db");
    let pool = create_pool(db_path.to_str().unwrap()).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteStore::new(pool.clone(), time_provider.clone()));
    let products = SqliteProductRepository::new(pool, time_provider);
    let branches = Arc::new(ProductBranches::new(Barrier::new(store.clone())));

    Fixture {
        _dir: dir,
        store,
        products,
        branches,
    }
}

fn call(gid: &str, branch_id: &str, op: BranchOp) -> BranchCall {
    BranchCall::new("saga", gid, branch_id, op).unwrap()
}

async fn new_product(fx: &Fixture, stock: i64) -> i64 {
    fx.products
        .insert(&Product::new(0, "widget", stock, 100))
        .await
        .unwrap()
}

async fn stock_of(fx: &Fixture, id: i64) -> i64 {
    fx.products.find_by_id(id).await.unwrap().unwrap().stock
}

/// Test 1: Same action delivered twice concurrently applies once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_action_applies_once() {
    let fx = setup().await;
    let id = new_product(&fx, 10).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let branches = fx.branches.clone();
        handles.push(tokio::spawn(async move {
            branches
                .decr_stock(&call("g1", "b1", BranchOp::Action), StockRequest { id, num: 3 })
                .await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }
    outcomes.sort_by_key(|o| o.as_str());

    assert_eq!(
        outcomes,
        vec![BarrierOutcome::Duplicate, BarrierOutcome::Executed]
    );
    assert_eq!(stock_of(&fx, id).await, 7);
}

/// Test 2: Many concurrent deliveries of the same action, one effect
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_deliveries_at_most_once() {
    let fx = setup().await;
    let id = new_product(&fx, 100).await;

    let calls = (0..8).map(|_| {
        let branches = fx.branches.clone();
        tokio::spawn(async move {
            branches
                .decr_stock(&call("g-many", "01", BranchOp::Action), StockRequest { id, num: 5 })
                .await
        })
    });
    let results = futures::future::join_all(calls).await;

    let executed = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .filter(|o| *o == BarrierOutcome::Executed)
        .count();

    assert_eq!(executed, 1);
    assert_eq!(stock_of(&fx, id).await, 95);
}

/// Test 3: Compensation with no prior action is a no-op and blocks the late action
#[tokio::test]
async fn test_null_compensation_then_suppressed_action() {
    let fx = setup().await;
    let id = new_product(&fx, 10).await;

    let outcome = fx
        .branches
        .decr_stock_revert(&call("g2", "b2", BranchOp::Compensate), StockRequest { id, num: 3 })
        .await
        .unwrap();
    assert_eq!(outcome, BarrierOutcome::NullCompensation);
    assert_eq!(stock_of(&fx, id).await, 10);

    let outcome = fx
        .branches
        .decr_stock(&call("g2", "b2", BranchOp::Action), StockRequest { id, num: 3 })
        .await
        .unwrap();
    assert_eq!(outcome, BarrierOutcome::Suppressed);
    assert_eq!(stock_of(&fx, id).await, 10);

    let entries = fx.store.find_branch("g2", "b2").await.unwrap();
    let ops: Vec<BranchOp> = entries.into_iter().map(|e| e.op).collect();
    assert_eq!(ops, vec![BranchOp::Compensate, BranchOp::Action]);
}

/// Test 4: action, compensate, retried action ends where compensate left it
#[tokio::test]
async fn test_anti_dangling() {
    let fx = setup().await;
    let id = new_product(&fx, 10).await;
    let req = StockRequest { id, num: 4 };

    let outcome = fx
        .branches
        .decr_stock(&call("g3", "01", BranchOp::Action), req.clone())
        .await
        .unwrap();
    assert_eq!(outcome, BarrierOutcome::Executed);
    assert_eq!(stock_of(&fx, id).await, 6);

    let outcome = fx
        .branches
        .decr_stock_revert(&call("g3", "01", BranchOp::Compensate), req.clone())
        .await
        .unwrap();
    assert_eq!(outcome, BarrierOutcome::Executed);
    assert_eq!(stock_of(&fx, id).await, 10);

    let outcome = fx
        .branches
        .decr_stock(&call("g3", "01", BranchOp::Action), req)
        .await
        .unwrap();
    assert_eq!(outcome, BarrierOutcome::Duplicate);
    assert_eq!(stock_of(&fx, id).await, 10);
}

/// Test 5: Action and compensate racing always end at the original stock
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_action_and_compensate() {
    let fx = setup().await;
    let id = new_product(&fx, 10).await;

    for round in 0..5 {
        let gid = format!("g-race-{}", round);

        let action = {
            let branches = fx.branches.clone();
            let call = call(&gid, "01", BranchOp::Action);
            tokio::spawn(async move { branches.decr_stock(&call, StockRequest { id, num: 2 }).await })
        };
        let compensate = {
            let branches = fx.branches.clone();
            let call = call(&gid, "01", BranchOp::Compensate);
            tokio::spawn(async move {
                branches
                    .decr_stock_revert(&call, StockRequest { id, num: 2 })
                    .await
            })
        };

        action.await.unwrap().unwrap();
        compensate.await.unwrap().unwrap();

        assert_eq!(stock_of(&fx, id).await, 10, "round {}", round);
    }
}

/// Test 6: Failed branch leaves no ledger row; corrected retry applies once
#[tokio::test]
async fn test_rollback_on_failure_then_retry() {
    let fx = setup().await;
    let id = new_product(&fx, 2).await;

    let err = fx
        .branches
        .decr_stock(&call("g4", "01", BranchOp::Action), StockRequest { id, num: 3 })
        .await
        .unwrap_err();
    assert!(err.is_branch_failure());
    assert!(!err.is_retryable());
    assert_eq!(stock_of(&fx, id).await, 2);
    assert!(fx.store.find_branch("g4", "01").await.unwrap().is_empty());

    for expected in [BarrierOutcome::Executed, BarrierOutcome::Duplicate] {
        let outcome = fx
            .branches
            .decr_stock(&call("g4", "01", BranchOp::Action), StockRequest { id, num: 2 })
            .await
            .unwrap();
        assert_eq!(outcome, expected);
    }
    assert_eq!(stock_of(&fx, id).await, 0);
}

/// Test 7: Missing product is a branch failure, not a retry
#[tokio::test]
async fn test_missing_product_fails_branch() {
    let fx = setup().await;

    let err = fx
        .branches
        .decr_stock(&call("g5", "01", BranchOp::Action), StockRequest { id: 404, num: 1 })
        .await
        .unwrap_err();
    assert!(err.is_branch_failure());
    assert!(err.to_string().contains("not found"));
}

/// Test 8: A transaction dropped before commit leaves no ledger row
#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let fx = setup().await;

    {
        let mut tx = fx.store.begin_transaction().await.unwrap();
        assert!(tx
            .try_record(&call("g6", "01", BranchOp::Action))
            .await
            .unwrap());
    }

    // The row is recordable again, so nothing was committed
    let mut tx = fx.store.begin_transaction().await.unwrap();
    assert!(tx
        .try_record(&call("g6", "01", BranchOp::Action))
        .await
        .unwrap());
    drop(tx);

    let stats = fx.store.stats().await.unwrap();
    assert_eq!(stats.total, 0);
}
