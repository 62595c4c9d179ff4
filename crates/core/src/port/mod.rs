// Port Layer - Interfaces for external dependencies

pub mod document_store;
pub mod id_provider; // For deterministic testing
pub mod time_provider;

// Re-exports
pub use document_store::DocumentStore;
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;

#[cfg(test)]
pub use document_store::MockDocumentStore;
