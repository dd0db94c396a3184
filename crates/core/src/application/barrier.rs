// Branch Barrier
//
// Wraps a branch's business unit of work in one local transaction together
// with its ledger row. The ledger's unique key is the only lock: the insert
// decides duplicates, the paired row decides null compensation and dangling
// execution.

use crate::domain::BranchCall;
use crate::error::{AppError, Result};
use crate::port::{LedgerTransaction, Transaction, TransactionalStore};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Business logic run inside the barrier's transaction
///
/// Receives the open transaction explicitly and must do all reads and writes
/// through it, so a rollback undoes every partial effect.
#[async_trait]
pub trait UnitOfWork<T: Send>: Send {
    async fn execute(self, tx: &mut T) -> Result<()>;
}

/// Successful barrier results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierOutcome {
    /// Unit of work ran and committed with its ledger row
    Executed,
    /// Same op already recorded for this branch, nothing ran
    Duplicate,
    /// Undo arrived before its forward op; recorded, nothing undone
    NullCompensation,
    /// Forward op arrived after its undo; recorded, nothing applied
    Suppressed,
}

impl BarrierOutcome {
    /// Whether business state changed
    pub fn applied(self) -> bool {
        matches!(self, BarrierOutcome::Executed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BarrierOutcome::Executed => "executed",
            BarrierOutcome::Duplicate => "duplicate",
            BarrierOutcome::NullCompensation => "null_compensation",
            BarrierOutcome::Suppressed => "suppressed",
        }
    }
}

impl std::fmt::Display for BarrierOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Run,
    Skip(BarrierOutcome),
}

/// Decide after a successful insert. `paired_exists` is `None` for ops
/// without a pair.
fn decide(call: &BranchCall, paired_exists: Option<bool>) -> Decision {
    match (call.op.is_rollback(), paired_exists) {
        (_, None) => Decision::Run,
        (true, Some(true)) => Decision::Run,
        (true, Some(false)) => Decision::Skip(BarrierOutcome::NullCompensation),
        (false, Some(true)) => Decision::Skip(BarrierOutcome::Suppressed),
        (false, Some(false)) => Decision::Run,
    }
}

/// Idempotency and ordering guard for saga branches
pub struct Barrier<S> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S> Clone for Barrier<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: TransactionalStore> Barrier<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bound every branch call. On expiry the open transaction is dropped
    /// (rolled back) and the call fails as retryable.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `work` at most once for `call`
    ///
    /// # Errors
    ///
    /// * `AppError::BranchFailure` - the unit of work failed; nothing persisted
    /// * `AppError::Database` / `AppError::Timeout` / `AppError::Io` - retryable,
    ///   nothing persisted, whether raised by the store or inside the unit of work
    pub async fn run<W>(&self, call: &BranchCall, work: W) -> Result<BarrierOutcome>
    where
        W: UnitOfWork<S::Tx>,
    {
        call.validate()?;

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_in_transaction(call, work))
                .await
                .map_err(|_| {
                    AppError::Timeout(format!(
                        "branch {}/{} ({}) exceeded {}ms",
                        call.gid,
                        call.branch_id,
                        call.op,
                        limit.as_millis()
                    ))
                })??,
            None => self.run_in_transaction(call, work).await?,
        };

        info!(
            gid = %call.gid,
            branch_id = %call.branch_id,
            op = %call.op,
            outcome = %outcome,
            "Branch call finished"
        );

        Ok(outcome)
    }

    async fn run_in_transaction<W>(&self, call: &BranchCall, work: W) -> Result<BarrierOutcome>
    where
        W: UnitOfWork<S::Tx>,
    {
        // Insert first: the write lock is taken before any read
        let mut tx = self.store.begin_transaction().await?;

        if !tx.try_record(call).await? {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback after duplicate failed");
            }
            debug!(gid = %call.gid, branch_id = %call.branch_id, op = %call.op, "Duplicate delivery");
            return Ok(BarrierOutcome::Duplicate);
        }

        let paired_exists = match call.paired_op() {
            Some(paired) => Some(tx.exists(&call.gid, &call.branch_id, &paired).await?),
            None => None,
        };

        match decide(call, paired_exists) {
            Decision::Skip(outcome) => {
                // The row itself is the effect: it blocks the other side forever
                tx.commit().await?;
                Ok(outcome)
            }
            Decision::Run => {
                if let Err(err) = work.execute(&mut tx).await {
                    if let Err(e) = tx.rollback().await {
                        warn!(error = %e, "Rollback after branch failure failed");
                    }
                    let failure = err.into_branch_failure();
                    warn!(
                        gid = %call.gid,
                        branch_id = %call.branch_id,
                        op = %call.op,
                        error = %failure,
                        retryable = failure.is_retryable(),
                        "Branch rolled back"
                    );
                    return Err(failure);
                }
                tx.commit().await?;
                Ok(BarrierOutcome::Executed)
            }
        }
    }
}
