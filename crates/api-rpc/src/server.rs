//! JSON-RPC Server
//!
//! Serves the gateway over JSON-RPC 2.0 on TCP.

use crate::error::RpcServerError;
use crate::handler::RpcHandler;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AccountRequest, CreateRecordRequest, DeleteRecordRequest, UpdateRecordRequest,
    UpsertProfileRequest,
};
use jobledger_core::PersistenceGateway;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    /// Token bucket size
    pub rate_limit_burst: u32,
    /// Tokens per second
    pub rate_limit_rate: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit_burst: 200,
            rate_limit_rate: 100,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

/// Register `$method` so that its params parse into `$req` and go to `$call`
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $req:ty, $call:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($method, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$call(req).await
                }
            })
            .map_err(|e| RpcServerError::Register {
                method: $method,
                reason: e.to_string(),
            })?;
    }};
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, gateway: Arc<PersistenceGateway>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_burst,
            config.rate_limit_rate,
        ));
        Self {
            config,
            handler: Arc::new(RpcHandler::new(gateway, rate_limiter)),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>, RpcServerError> {
        let mut module = RpcModule::new(());

        register!(module, self.handler, "records.list.v1", AccountRequest, list_records);
        register!(module, self.handler, "records.create.v1", CreateRecordRequest, create_record);
        register!(module, self.handler, "records.update.v1", UpdateRecordRequest, update_record);
        register!(module, self.handler, "records.delete.v1", DeleteRecordRequest, delete_record);
        register!(module, self.handler, "records.summary.v1", AccountRequest, summary);
        register!(module, self.handler, "profile.get.v1", AccountRequest, get_profile);
        register!(module, self.handler, "profile.upsert.v1", UpsertProfileRequest, upsert_profile);

        let handler = self.handler.clone();
        module
            .register_async_method("system.status.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.status().await }
            })
            .map_err(|e| RpcServerError::Register {
                method: "system.status.v1",
                reason: e.to_string(),
            })?;

        Ok(module)
    }

    /// Bind and start serving. Returns the bound address and a stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), RpcServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let module = self.module()?;

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| RpcServerError::Bind {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        let local_addr = server.local_addr().map_err(|e| RpcServerError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

        let handle = server.start(module);
        info!(addr = %local_addr, "JSON-RPC server started successfully");
        Ok((local_addr, handle))
    }
}
