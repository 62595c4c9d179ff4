// Application Layer - Gateway and read-side use cases

pub mod gateway;
pub mod outcome;
pub mod summary;

// Re-exports
pub use gateway::{Availability, PersistenceGateway};
pub use outcome::{FailureKind, Outcome, Source};
pub use summary::{summarize, JobSummary};
