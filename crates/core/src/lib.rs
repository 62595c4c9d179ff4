// Job Ledger Core - Record Model, Store Ports & Persistence Gateway
// NO infrastructure dependencies (hexagonal architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{FailureKind, Outcome, PersistenceGateway, Source};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
