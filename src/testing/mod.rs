//! Helpers shared by unit tests: fixture keys, token minting and a ready ledger.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{KeySource, TokenVerifier};
use crate::config::AppConfig;
use crate::database::memory::MemoryLedger;
use crate::handlers::AppState;
use crate::types::AccountId;

pub const SIGNING_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/signing_key.pem");
pub const SIGNING_PUBLIC_KEY: &str = include_str!("../../tests/fixtures/signing_key.pub.pem");
pub const FOREIGN_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/foreign_key.pem");

/// Claim set with the deployment's namespaced role claim, expiring `exp_in` seconds from now.
pub fn claims_json(sub: &str, role: &str, exp_in: i64) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": sub,
        "https://jan.monster/role": role,
        "iat": now,
        "exp": now + exp_in,
    })
}

pub fn mint(claims: Value) -> String {
    mint_with_key(claims, SIGNING_PRIVATE_KEY)
}

pub fn mint_with_key(claims: Value, private_pem: &str) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("fixture key");
    encode(&Header::new(Algorithm::RS256), &claims, &key).expect("token")
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.auth.key = KeySource::Pem(SIGNING_PUBLIC_KEY.to_string());
    config
}

pub fn test_verifier() -> TokenVerifier {
    TokenVerifier::from_config(&test_config().auth).expect("fixture verifier")
}

pub fn account(n: i64) -> AccountId {
    AccountId::new(n).expect("non-negative account")
}

/// App state over a fresh in-memory ledger; the ledger handle is returned for seeding.
pub fn test_state() -> (AppState, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    let state = AppState::new(&test_config(), ledger.clone()).expect("state");
    (state, ledger)
}
