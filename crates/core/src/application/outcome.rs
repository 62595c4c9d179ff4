// Gateway Outcomes

use crate::error::AppError;
use serde::Serialize;

/// Which store answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Primary,
    /// Not executed; the client should use its secondary store
    Deferred,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Primary => write!(f, "primary"),
            Source::Deferred => write!(f, "deferred"),
        }
    }
}

/// Cause class of a failed store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Payload failed validation; the store was not touched
    Rejected,
    /// Store busy, locked or unreachable; retrying later may succeed
    Transient,
    Internal,
}

impl From<&AppError> for FailureKind {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Domain(_) => FailureKind::Rejected,
            AppError::Unavailable(_) => FailureKind::Transient,
            _ => FailureKind::Internal,
        }
    }
}

/// Result of every gateway operation. Errors never escape as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    NotFound,
    Failure(FailureKind),
    /// Primary store unavailable for this process
    Deferred,
}

impl<T> Outcome<T> {
    pub fn source(&self) -> Source {
        match self {
            Outcome::Deferred => Source::Deferred,
            _ => Source::Primary,
        }
    }

    /// Collapsed boolean view (`true` only for `Success`)
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Outcome::Deferred)
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Failure(kind) => Outcome::Failure(kind),
            Outcome::Deferred => Outcome::Deferred,
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Success value, or `T::default()` for every other outcome
    pub fn unwrap_or_default(self) -> T {
        self.success().unwrap_or_default()
    }
}
