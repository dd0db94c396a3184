// Application Layer - Barrier and participant branch use cases

pub mod barrier;
pub mod order;
pub mod product;

// Re-exports
pub use barrier::{Barrier, BarrierOutcome, UnitOfWork};
pub use order::{CreateOrderRequest, OrderBranches, RevertOrderRequest};
pub use product::{ProductBranches, StockRequest};
