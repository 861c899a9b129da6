use serde::{Serialize, Serializer};
use std::fmt;

/// Authorization tier carried in the token's role claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Parent,
    Child,
    /// Any other role string. Never allowed to write.
    Unrecognized(String),
}

impl Role {
    pub fn from_claim(value: &str) -> Self {
        match value {
            "parent" => Role::Parent,
            "child" => Role::Child,
            other => Role::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
            Role::Unrecognized(other) => other,
        }
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Role::Parent)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Verified identity of the caller. Only produced by `TokenVerifier::verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub subject: String,
    pub role: Role,
    /// Account the token was issued for. Informational unless account binding is enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
}
