//! User Service Client
//!
//! `UserDirectory` backed by the user service's `user.info.v1` method.

use crate::error::code;
use async_trait::async_trait;
use branchguard_core::error::{AppError, Result};
use branchguard_core::port::UserDirectory;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::ClientError;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

const USER_INFO_METHOD: &str = "user.info.v1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// JSON-RPC client for the user service
pub struct RpcUserDirectory {
    client: HttpClient,
}

impl RpcUserDirectory {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .map_err(|e| AppError::Config(format!("invalid user service url {}: {}", url, e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UserDirectory for RpcUserDirectory {
    async fn user_exists(&self, uid: i64) -> Result<bool> {
        let mut params = ObjectParams::new();
        params.insert("id", uid)?;

        match self
            .client
            .request::<serde_json::Value, _>(USER_INFO_METHOD, params)
            .await
        {
            Ok(_) => Ok(true),
            Err(ClientError::Call(err)) if err.code() == code::NOT_FOUND => {
                debug!(uid, "User not found");
                Ok(false)
            }
            Err(ClientError::Call(err)) => {
                warn!(uid, code = err.code(), error = %err.message(), "User lookup rejected");
                Err(AppError::Internal(format!(
                    "user service error {}: {}",
                    err.code(),
                    err.message()
                )))
            }
            Err(ClientError::RequestTimeout) => {
                Err(AppError::Timeout(format!("user lookup for {}", uid)))
            }
            Err(e) => {
                warn!(uid, error = %e, "User service unreachable");
                Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("user service unreachable: {}", e),
                )))
            }
        }
    }
}
