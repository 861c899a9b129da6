use thiserror::Error;

use super::claims::Claims;
use crate::types::{Access, AccountId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Decides whether verified claims may touch an account.
///
/// Any verified token may read any account, and a parent token may write to
/// any account. Matching the token's bound account against the path is
/// opt-in via `enforce_account_binding`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard {
    enforce_account_binding: bool,
}

impl AccessGuard {
    pub fn new(enforce_account_binding: bool) -> Self {
        Self { enforce_account_binding }
    }

    pub fn authorize(&self, claims: &Claims, target: AccountId, access: Access) -> Result<(), AuthError> {
        if self.enforce_account_binding {
            let bound = claims.account.as_deref();
            if bound != Some(target.to_string().as_str()) {
                tracing::warn!(
                    "Account binding refused: subject '{}' bound to {:?} requested account {}",
                    claims.subject,
                    bound,
                    target
                );
                return Err(AuthError::Forbidden("account not bound to token".to_string()));
            }
        }

        if access == Access::Write && !claims.role.can_write() {
            tracing::warn!(
                "Write refused: subject '{}' with role '{}' tried to post to account {}",
                claims.subject,
                claims.role,
                target
            );
            return Err(AuthError::Forbidden(format!("role '{}' may not post transactions", claims.role)));
        }

        Ok(())
    }
}
