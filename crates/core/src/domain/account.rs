// Account Profile Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account identifier (caller-supplied, trusted as given)
pub type AccountId = String;

/// Reject ids the store cannot key a document by
pub fn validate_account_id(account_id: &str) -> Result<()> {
    if account_id.trim().is_empty() {
        return Err(DomainError::EmptyAccountId);
    }
    Ok(())
}

/// Closed set of values an account profile attribute can hold.
///
/// JSON `null` and nested objects do not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<ProfileValue>),
}

impl From<&str> for ProfileValue {
    fn from(s: &str) -> Self {
        ProfileValue::Text(s.to_string())
    }
}

impl From<String> for ProfileValue {
    fn from(s: String) -> Self {
        ProfileValue::Text(s)
    }
}

impl From<i64> for ProfileValue {
    fn from(n: i64) -> Self {
        ProfileValue::Integer(n)
    }
}

impl From<bool> for ProfileValue {
    fn from(b: bool) -> Self {
        ProfileValue::Bool(b)
    }
}

/// Schema-less account profile (name, contact info, role, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountProfile(BTreeMap<String, ProfileValue>);

impl AccountProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ProfileValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge write: incoming fields overwrite same-named ones, the rest stay
    pub fn merge(&mut self, incoming: &AccountProfile) {
        for (key, value) in &incoming.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }
}
