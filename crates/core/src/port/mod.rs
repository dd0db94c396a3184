// Port Layer - Interfaces for external dependencies

pub mod ledger;
pub mod order_repository;
pub mod product_repository;
pub mod time_provider;
pub mod transaction;
pub mod user_directory;

// Re-exports
pub use ledger::{LedgerReader, LedgerStats, LedgerTransaction};
pub use order_repository::{OrderRepository, OrderTransaction};
pub use product_repository::{ProductRepository, ProductTransaction};
pub use time_provider::TimeProvider;
pub use transaction::{Transaction, TransactionalStore};
pub use user_directory::UserDirectory;
