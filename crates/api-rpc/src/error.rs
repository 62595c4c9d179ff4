//! RPC Error Types
//!
//! Maps gateway outcomes to JSON-RPC error codes. Callers get an
//! operation-level signal only; root causes stay in the server logs.

use jobledger_core::FailureKind;
use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const THROTTLED: i32 = 4003;
    pub const STORE_ERROR: i32 = 5001;
}

/// Server lifecycle errors
#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error("Failed to bind JSON-RPC server on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Failed to register method {method}: {reason}")]
    Register { method: &'static str, reason: String },
}

/// Error for a failed gateway call
pub fn failure_error(kind: FailureKind) -> ErrorObjectOwned {
    match kind {
        FailureKind::Rejected => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, "Invalid request", None::<()>)
        }
        FailureKind::Transient | FailureKind::Internal => ErrorObjectOwned::owned(
            code::STORE_ERROR,
            "Primary store operation failed",
            None::<()>,
        ),
    }
}

pub fn not_found_error(what: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code::NOT_FOUND, what.into(), None::<()>)
}

pub fn throttled_error() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}
