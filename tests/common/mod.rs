#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bankhaus_api::auth::KeySource;
use bankhaus_api::config::AppConfig;
use bankhaus_api::database::MemoryLedger;
use bankhaus_api::handlers::{app, AppState};
use bankhaus_api::types::AccountId;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const SIGNING_PRIVATE_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const SIGNING_PUBLIC_KEY: &str = include_str!("../fixtures/signing_key.pub.pem");
pub const FOREIGN_PRIVATE_KEY: &str = include_str!("../fixtures/foreign_key.pem");

/// An in-process server on a free port, backed by an in-memory ledger.
/// The server task lives as long as the test's runtime.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub ledger: Arc<MemoryLedger>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let mut config = AppConfig::for_testing();
        config.auth.key = KeySource::Pem(SIGNING_PUBLIC_KEY.to_string());
        config.server.ping_path = Some("ping-me".to_string());
        Self::spawn_with(config).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let ledger = Arc::new(MemoryLedger::new());
        let state = AppState::new(&config, ledger.clone())?;
        let router = app(state, &config);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await;
        });

        let server = Self {
            port,
            base_url,
            ledger,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn open_account(&self, number: i64, balance: i64) -> AccountId {
        let account = AccountId::new(number).expect("non-negative account");
        self.ledger.open_account(account, balance).await;
        account
    }

    pub async fn get_account(&self, number: i64, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(&format!("/api/{}", number)))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn post_transaction(&self, number: i64, token: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(&format!("/api/{}", number)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?)
    }
}

/// Claim set with the namespaced role claim, expiring `exp_in` seconds from now.
pub fn claims(sub: &str, role: &str, exp_in: i64) -> Value {
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

pub fn parent_token() -> String {
    mint(claims("auth0|parent", "parent", 3600))
}

pub fn child_token() -> String {
    mint(claims("auth0|child", "child", 3600))
}
