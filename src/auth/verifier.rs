use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::claims::{Claims, Role};
use super::keys::KeyError;
use crate::config::AuthConfig;

/// Why a bearer token was refused. Logged server-side only; every variant
/// becomes the same 401 at the HTTP boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("unexpected issuer")]
    InvalidIssuer,

    #[error("unexpected audience")]
    InvalidAudience,

    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
            ErrorKind::ExpiredSignature => VerificationError::Expired,
            ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
            ErrorKind::InvalidIssuer => VerificationError::InvalidIssuer,
            ErrorKind::InvalidAudience => VerificationError::InvalidAudience,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => VerificationError::Malformed(err.to_string()),
            _ => VerificationError::Rejected(err.to_string()),
        }
    }
}

/// Claim payload as it arrives. Role and account live under configurable
/// (namespaced) keys, so they are picked out of `extra`.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Verifies RS256 bearer tokens against one statically configured public key.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    role_claim: String,
    account_claim: String,
}

impl TokenVerifier {
    pub fn new(key: DecodingKey, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key,
            validation,
            role_claim: config.role_claim.clone(),
            account_claim: config.account_claim.clone(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
        Ok(Self::new(config.key.decoding_key()?, config))
    }

    /// Checks signature, claim shape and validity window, in that order.
    /// No claims are produced unless every check passes.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        let data = decode::<RawClaims>(token, &self.key, &self.validation)?;
        let raw = data.claims;

        let subject = raw
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerificationError::Malformed("missing subject".to_string()))?;

        let role = raw
            .extra
            .get(&self.role_claim)
            .or_else(|| raw.extra.get("role"))
            .and_then(Value::as_str)
            .map(Role::from_claim)
            .ok_or_else(|| VerificationError::Malformed("missing role claim".to_string()))?;

        let account = match raw.extra.get(&self.account_claim) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Claims {
            subject,
            role,
            account,
            expires_at: raw.exp,
            issued_at: raw.iat,
            not_before: raw.nbf,
        })
    }
}
