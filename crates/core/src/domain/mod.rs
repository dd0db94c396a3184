// Domain Layer - Barrier vocabulary and participant entities

pub mod branch;
pub mod error;
pub mod order;
pub mod product;

// Re-exports
pub use branch::{BranchCall, BranchId, BranchOp, Gid, LedgerEntry};
pub use error::DomainError;
pub use order::{Order, OrderId, OrderStatus};
pub use product::{Product, ProductId};
