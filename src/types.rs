/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of access a request needs on an account.
/// GET handlers ask for `Read`, POST handlers ask for `Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write, // Posts a transaction and moves the balance
}

/// Account number as it appears in `/api/{account}` and in the `account.actno` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid account number: {0:?}")]
pub struct InvalidAccountId(pub String);

impl AccountId {
    pub fn new(value: i64) -> Option<Self> {
        (value >= 0).then_some(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for AccountId {
    type Err = InvalidAccountId;

    /// Only plain ASCII digits are accepted, so "+7", "-1", " 7" and "7a" all fail.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAccountId(s.to_string()));
        }
        s.parse::<i64>()
            .ok()
            .and_then(AccountId::new)
            .ok_or_else(|| InvalidAccountId(s.to_string()))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
