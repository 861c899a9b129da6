use anyhow::Context;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;

/// Check a token against the configured key and print the accepted claims as JSON.
pub fn handle(config: &AppConfig, token: &str) -> anyhow::Result<()> {
    let verifier = TokenVerifier::from_config(&config.auth).context("failed to load token verification key")?;
    let claims = verifier.verify(token.trim()).context("token rejected")?;

    println!("{}", serde_json::to_string_pretty(&claims)?);
    println!("can write: {}", claims.role.can_write());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{claims_json, mint, test_config};

    #[test]
    fn accepts_valid_token() {
        let token = mint(claims_json("auth0|parent", "parent", 60));
        assert!(handle(&test_config(), &token).is_ok());
    }

    #[test]
    fn rejects_expired_token() {
        let token = mint(claims_json("auth0|parent", "parent", -60));
        let err = handle(&test_config(), &token).unwrap_err();
        assert!(err.to_string().contains("token rejected"));
    }
}
