//! Daemon configuration from `BRANCHGUARD_*` environment variables

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.branchguard/participant.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9530;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    /// Daily-rotated log files are written here when set
    pub log_dir: Option<PathBuf>,
    /// User service endpoint; every user is accepted when unset
    pub user_rpc_url: Option<String>,
    pub branch_timeout: Option<Duration>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = get("BRANCHGUARD_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = shellexpand::tilde(&db_path).into_owned();

        let rpc_port = match get("BRANCHGUARD_RPC_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("BRANCHGUARD_RPC_PORT is not a port: {}", raw))?,
            None => DEFAULT_RPC_PORT,
        };

        let log_format = match get("BRANCHGUARD_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let branch_timeout = match get("BRANCHGUARD_BRANCH_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw.parse().with_context(|| {
                    format!("BRANCHGUARD_BRANCH_TIMEOUT_MS is not a number: {}", raw)
                })?;
                // 0 disables the deadline
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            None => None,
        };

        Ok(Self {
            db_path,
            rpc_host: get("BRANCHGUARD_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port,
            log_format,
            log_dir: get("BRANCHGUARD_LOG_DIR")
                .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned())),
            user_rpc_url: get("BRANCHGUARD_USER_RPC_URL"),
            branch_timeout,
        })
    }
}
