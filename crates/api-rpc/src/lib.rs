//! JSON-RPC API Layer
//!
//! Branch endpoints of the product and order participants. Every branch
//! method carries a `barrier` object (trans_type, gid, branch_id, op) and
//! answers the coordinator with success, or an error whose `data.result` is
//! `FAILURE` (roll the saga back) or `ONGOING` (retry the branch).

pub mod error;
pub mod handler;
pub mod server;
pub mod types;
pub mod user_directory;

pub use server::RpcServer;
pub use user_directory::RpcUserDirectory;
