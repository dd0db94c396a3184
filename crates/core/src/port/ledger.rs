// Dedup Ledger Port

use crate::domain::{BranchCall, BranchOp, LedgerEntry};
use crate::error::Result;
use crate::port::Transaction;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Ledger operations within a transaction
#[async_trait]
pub trait LedgerTransaction: Transaction {
    /// Record that `call` was attempted.
    ///
    /// Returns `false` when a row for the same (gid, branch_id, op) already
    /// exists; the uniqueness violation is the dedup signal, not an error.
    async fn try_record(&mut self, call: &BranchCall) -> Result<bool>;

    /// Whether a row exists for (gid, branch_id, op)
    async fn exists(&mut self, gid: &str, branch_id: &str, op: &BranchOp) -> Result<bool>;
}

/// Row counts of the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub total: i64,
    pub by_op: BTreeMap<String, i64>,
}

/// Read-only ledger queries (admin surface)
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Count rows per op
    async fn stats(&self) -> Result<LedgerStats>;

    /// All recorded ops of one branch, oldest first
    async fn find_branch(&self, gid: &str, branch_id: &str) -> Result<Vec<LedgerEntry>>;
}
