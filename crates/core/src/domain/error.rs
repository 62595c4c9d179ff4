// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Field {field} must be a finite amount, got {value}")]
    NonFiniteAmount { field: &'static str, value: f64 },

    #[error("duration_days must not be negative, got {0}")]
    NegativeDuration(i64),

    #[error("attachment reference at position {0} is empty")]
    EmptyAttachmentRef(usize),

    #[error("account id must not be empty")]
    EmptyAccountId,
}

pub type Result<T> = std::result::Result<T, DomainError>;
