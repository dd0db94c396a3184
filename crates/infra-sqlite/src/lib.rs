// Branchguard Infrastructure - SQLite Adapter
// Implements: TransactionalStore (ledger + product + order), LedgerReader,
// ProductRepository, OrderRepository

mod connection;
mod error;
mod migration;
mod order_repository;
mod product_repository;
mod rows;
mod store;
mod transaction;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use order_repository::SqliteOrderRepository;
pub use product_repository::SqliteProductRepository;
pub use store::SqliteStore;
pub use transaction::SqliteBranchTransaction;

// sqlx::Error conversion is done by the map_sqlx_error helper
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
