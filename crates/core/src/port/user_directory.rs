// User Directory Port
//
// Lookups against the user service. Not covered by the barrier, so
// implementations must be read-only.

use crate::error::Result;
use async_trait::async_trait;

/// User existence checks against the owning service
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, uid: i64) -> Result<bool>;
}

/// Directory that accepts every user (no user service configured)
pub struct AcceptAllUsers;

#[async_trait]
impl UserDirectory for AcceptAllUsers {
    async fn user_exists(&self, uid: i64) -> Result<bool> {
        tracing::debug!(uid, "No user service configured, accepting user");
        Ok(true)
    }
}
