// Transaction port for atomic branch operations

use crate::error::Result;
use crate::port::LedgerTransaction;
use async_trait::async_trait;

/// Local database transaction
///
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self) -> Result<()>;
}

/// Store able to open participant transactions
///
/// The transaction type is concrete so business units of work can require
/// exactly the repository capabilities they need (`ProductTransaction`,
/// `OrderTransaction`) on the same handle that holds the ledger row.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    type Tx: LedgerTransaction + 'static;

    /// Begin a new local transaction
    async fn begin_transaction(&self) -> Result<Self::Tx>;
}
