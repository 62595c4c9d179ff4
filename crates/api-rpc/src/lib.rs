//! JSON-RPC API Layer
//!
//! Exposes the persistence gateway as JSON-RPC 2.0 methods. Every response
//! carries a `source` of `primary` or `deferred`; a deferred response tells
//! the client to serve the request from its own secondary store.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};
