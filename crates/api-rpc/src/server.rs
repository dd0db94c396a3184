//! JSON-RPC Server
//!
//! Serves the participant's branch methods over HTTP.

use crate::handler::RpcHandler;
use crate::types::{
    BranchLedgerRequest, CreateOrderBranchRequest, CreateProductRequest, OrderDetailRequest,
    ProductDetailRequest, RevertOrderBranchRequest, StatsRequest, StockBranchRequest,
};
use branchguard_core::port::{OrderTransaction, ProductTransaction, TransactionalStore};
use jsonrpsee::core::RegisterMethodError;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9530;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Failed to register method: {0}")]
    Register(#[from] RegisterMethodError),
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer<S> {
    config: RpcServerConfig,
    handler: Arc<RpcHandler<S>>,
}

// Registers `$method` so that its params parse as `$req` and are passed to
// `RpcHandler::$call`.
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $req:ty, $call:ident) => {{
        let handler = $handler.clone();
        $module.register_async_method($method, move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: $req = params.parse()?;
                handler.$call(req).await
            }
        })?;
    }};
}

impl<S> RpcServer<S>
where
    S: TransactionalStore + 'static,
    S::Tx: ProductTransaction + OrderTransaction,
{
    pub fn new(config: RpcServerConfig, handler: RpcHandler<S>) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>, ServerError> {
        let mut module = RpcModule::new(());

        // Branch methods (barrier-guarded)
        register!(module, self.handler, "product.decr_stock.v1", StockBranchRequest, decr_stock);
        register!(
            module,
            self.handler,
            "product.decr_stock_revert.v1",
            StockBranchRequest,
            decr_stock_revert
        );
        register!(module, self.handler, "order.create.v1", CreateOrderBranchRequest, create_order);
        register!(
            module,
            self.handler,
            "order.create_revert.v1",
            RevertOrderBranchRequest,
            create_order_revert
        );

        // Plain reads and setup
        register!(module, self.handler, "product.create.v1", CreateProductRequest, create_product);
        register!(module, self.handler, "product.detail.v1", ProductDetailRequest, product_detail);
        register!(module, self.handler, "order.detail.v1", OrderDetailRequest, order_detail);

        // Admin
        register!(module, self.handler, "admin.stats.v1", StatsRequest, stats);
        register!(module, self.handler, "admin.branch.v1", BranchLedgerRequest, branch_ledger);

        Ok(module)
    }

    /// Start the JSON-RPC server, returning the bound address and its handle
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let module = self.module()?;

        info!(addr = %local_addr, "JSON-RPC server started");

        Ok((local_addr, server.start(module)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use crate::handler::Repositories;
    use crate::types::{BranchResponse, CreateProductResponse};
    use branchguard_core::application::Barrier;
    use branchguard_core::port::time_provider::SystemTimeProvider;
    use branchguard_core::port::user_directory::AcceptAllUsers;
    use branchguard_infra_sqlite::{
        create_pool, run_migrations, SqliteOrderRepository, SqliteProductRepository, SqliteStore,
    };
    use jsonrpsee::core::client::ClientT;
    use jsonrpsee::core::params::ObjectParams;
    use jsonrpsee::http_client::HttpClientBuilder;
    use serde_json::json;

    async fn start_server() -> (SocketAddr, ServerHandle) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time_provider = Arc::new(SystemTimeProvider);
        let store = Arc::new(SqliteStore::new(pool.clone(), time_provider.clone()));
        let repos = Repositories {
            products: Arc::new(SqliteProductRepository::new(pool.clone(), time_provider)),
            orders: Arc::new(SqliteOrderRepository::new(pool)),
            ledger: store.clone(),
        };
        let handler = RpcHandler::new(Barrier::new(store), Arc::new(AcceptAllUsers), repos);

        let config = RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        RpcServer::new(config, handler).start().await.unwrap()
    }

    fn object(value: serde_json::Value) -> ObjectParams {
        let mut params = ObjectParams::new();
        if let serde_json::Value::Object(map) = value {
            for (key, value) in map {
                params.insert(&key, value).unwrap();
            }
        }
        params
    }

    #[tokio::test]
    async fn test_branch_call_over_http() {
        let (addr, handle) = start_server().await;
        let client = HttpClientBuilder::default()
            .build(format!("http://{}", addr))
            .unwrap();

        let created: CreateProductResponse = client
            .request(
                "product.create.v1",
                object(json!({"name": "widget", "stock": 10})),
            )
            .await
            .unwrap();

        let branch = json!({
            "barrier": {"trans_type": "saga", "gid": "g-http", "branch_id": "01", "op": "action"},
            "id": created.id,
            "num": 4
        });
        let resp: BranchResponse = client
            .request("product.decr_stock.v1", object(branch.clone()))
            .await
            .unwrap();
        assert_eq!(resp.outcome, "executed");

        let resp: BranchResponse = client
            .request("product.decr_stock.v1", object(branch))
            .await
            .unwrap();
        assert_eq!(resp.outcome, "duplicate");

        let overdraw = json!({
            "barrier": {"gid": "g-http-2", "branch_id": "01", "op": "action"},
            "id": created.id,
            "num": 100
        });
        let err = client
            .request::<BranchResponse, _>("product.decr_stock.v1", object(overdraw))
            .await
            .unwrap_err();
        match err {
            jsonrpsee::core::ClientError::Call(call_err) => {
                assert_eq!(call_err.code(), code::BRANCH_FAILURE);
                assert!(call_err.data().unwrap().get().contains("FAILURE"));
            }
            other => panic!("unexpected error: {}", other),
        }

        handle.stop().unwrap();
    }
}
