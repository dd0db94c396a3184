// SQLite participant store: opens branch transactions, reads the ledger

use crate::error::map_sqlx_error;
use crate::rows::LedgerRow;
use crate::SqliteBranchTransaction;
use async_trait::async_trait;
use branchguard_core::domain::LedgerEntry;
use branchguard_core::error::Result;
use branchguard_core::port::{LedgerReader, LedgerStats, TimeProvider, TransactionalStore};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TransactionalStore for SqliteStore {
    type Tx = SqliteBranchTransaction;

    async fn begin_transaction(&self) -> Result<SqliteBranchTransaction> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(SqliteBranchTransaction::new(tx, self.time_provider.clone()))
    }
}

#[async_trait]
impl LedgerReader for SqliteStore {
    async fn stats(&self) -> Result<LedgerStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT op, COUNT(*) FROM barrier GROUP BY op ORDER BY op")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let total: i64 = rows.iter().map(|(_, count)| count).sum();
        Ok(LedgerStats {
            total,
            by_op: rows.into_iter().collect(),
        })
    }

    async fn find_branch(&self, gid: &str, branch_id: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, trans_type, gid, branch_id, op, created_at
            FROM barrier
            WHERE gid = ? AND branch_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(gid)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(LedgerRow::into_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use branchguard_core::domain::{BranchCall, BranchOp};
    use branchguard_core::port::time_provider::FixedTimeProvider;
    use branchguard_core::port::{LedgerTransaction, Transaction};

    async fn setup_store() -> SqliteStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteStore::new(pool, Arc::new(FixedTimeProvider(1_700_000_000_000)))
    }

    fn call(op: BranchOp) -> BranchCall {
        BranchCall::new("saga", "gid-1", "01", op).unwrap()
    }

    #[tokio::test]
    async fn test_try_record_dedups() {
        let store = setup_store().await;

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(tx.try_record(&call(BranchOp::Action)).await.unwrap());
        assert!(!tx.try_record(&call(BranchOp::Action)).await.unwrap());
        assert!(tx.try_record(&call(BranchOp::Compensate)).await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(!tx.try_record(&call(BranchOp::Action)).await.unwrap());
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollback_discards_row() {
        let store = setup_store().await;

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(tx.try_record(&call(BranchOp::Try)).await.unwrap());
        tx.rollback().await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(!tx.exists("gid-1", "01", &BranchOp::Try).await.unwrap());
        assert!(tx.try_record(&call(BranchOp::Try)).await.unwrap());
        assert!(tx.exists("gid-1", "01", &BranchOp::Try).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_and_find_branch() {
        let store = setup_store().await;

        let mut tx = store.begin_transaction().await.unwrap();
        tx.try_record(&call(BranchOp::Action)).await.unwrap();
        tx.try_record(&call(BranchOp::Compensate)).await.unwrap();
        tx.try_record(&BranchCall::new("tcc", "gid-2", "01", BranchOp::Try).unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_op.get("action"), Some(&1));
        assert_eq!(stats.by_op.get("try"), Some(&1));

        let entries = store.find_branch("gid-1", "01").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].op, BranchOp::Action);
        assert_eq!(entries[1].op, BranchOp::Compensate);
        assert_eq!(entries[0].created_at, 1_700_000_000_000);
        assert_eq!(entries[0].trans_type, "saga");
    }
}
