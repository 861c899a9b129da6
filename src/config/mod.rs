use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::keys::KeySource;
use crate::logging::LogFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ledger: LedgerConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Secret liveness path, served as `GET /{ping}` when set
    pub ping_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub key: KeySource,
    pub role_claim: String,
    pub account_claim: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
    pub enforce_account_binding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub skip_undecodable_rows: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

pub const DEFAULT_ROLE_CLAIM: &str = "https://jan.monster/role";
pub const DEFAULT_ACCOUNT_CLAIM: &str = "https://jan.monster/account";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PING") {
            self.server.ping_path = Some(v.trim_matches('/').to_string()).filter(|p| !p.is_empty());
        }

        // Database overrides
        if let Some(url) = database_url(env::var("DATABASE_URL").ok(), env::var("PG_CONNECT").ok()) {
            self.database.url = Some(url);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Some(source) = KeySource::from_env() {
            self.auth.key = source;
        }
        if let Ok(v) = env::var("AUTH_ROLE_CLAIM") {
            self.auth.role_claim = v;
        }
        if let Ok(v) = env::var("AUTH_ACCOUNT_CLAIM") {
            self.auth.account_claim = v;
        }
        if let Ok(v) = env::var("AUTH_ISSUER") {
            self.auth.issuer = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("AUTH_AUDIENCE") {
            self.auth.audience = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("AUTH_LEEWAY_SECS") {
            self.auth.leeway_secs = v.parse().unwrap_or(self.auth.leeway_secs);
        }
        if let Ok(v) = env::var("AUTH_ENFORCE_ACCOUNT_BINDING") {
            self.auth.enforce_account_binding = v.parse().unwrap_or(self.auth.enforce_account_binding);
        }

        // Ledger overrides
        if let Ok(v) = env::var("LEDGER_SKIP_UNDECODABLE_ROWS") {
            self.ledger.skip_undecodable_rows = v.parse().unwrap_or(self.ledger.skip_undecodable_rows);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Logging overrides
        if let Ok(v) = env::var("LOG_FORMAT") {
            self.logging.format = LogFormat::from_str_lossy(&v);
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.logging.level = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                ping_path: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            auth: AuthConfig::defaults(),
            ledger: LedgerConfig {
                skip_undecodable_rows: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "https://jan.monster".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            logging: LoggingConfig {
                format: LogFormat::Pretty,
                level: "bankhaus_api=debug,tower_http=debug,info".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            logging: LoggingConfig {
                format: LogFormat::Json,
                level: "bankhaus_api=debug,info".to_string(),
            },
            ..Self::production()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                ping_path: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: AuthConfig::defaults(),
            ledger: LedgerConfig {
                skip_undecodable_rows: true,
            },
            api: ApiConfig {
                max_request_size_bytes: 16 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://jan.monster".to_string()],
            },
            logging: LoggingConfig {
                format: LogFormat::Json,
                level: "info".to_string(),
            },
        }
    }

    /// Development defaults without reading the environment, for tests and tooling.
    pub fn for_testing() -> Self {
        Self::development()
    }
}

/// First non-blank of DATABASE_URL and PG_CONNECT. A set-but-empty
/// DATABASE_URL does not hide PG_CONNECT.
fn database_url(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    let usable = |v: Option<String>| v.filter(|u| !u.trim().is_empty());
    usable(primary).or_else(|| usable(fallback))
}

impl AuthConfig {
    fn defaults() -> Self {
        Self {
            key: KeySource::BuiltIn,
            role_claim: DEFAULT_ROLE_CLAIM.to_string(),
            account_claim: DEFAULT_ACCOUNT_CLAIM.to_string(),
            issuer: None,
            audience: None,
            leeway_secs: 0,
            enforce_account_binding: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert!(config.ledger.skip_undecodable_rows);
        assert!(!config.auth.enforce_account_binding);
        assert_eq!(config.auth.role_claim, DEFAULT_ROLE_CLAIM);
        assert!(matches!(config.auth.key, KeySource::BuiltIn));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.security.cors_origins, vec!["https://jan.monster".to_string()]);
        assert_eq!(config.auth.leeway_secs, 0);
    }

    #[test]
    fn test_staging_inherits_production_security() {
        let config = AppConfig::staging();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.cors_origins, AppConfig::production().security.cors_origins);
    }

    #[test]
    fn test_empty_database_url_falls_back_to_pg_connect() {
        let pg = Some("postgres://bank@db/ledger".to_string());
        assert_eq!(database_url(Some(String::new()), pg.clone()), pg);
        assert_eq!(database_url(Some("  ".into()), pg.clone()), pg);
        assert_eq!(database_url(None, pg.clone()), pg);
        assert_eq!(
            database_url(Some("postgres://primary/db".into()), pg),
            Some("postgres://primary/db".to_string())
        );
        assert_eq!(database_url(Some(String::new()), Some(String::new())), None);
    }
}
