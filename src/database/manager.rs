use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use super::StorageError;
use crate::config::DatabaseConfig;

/// Build the shared connection pool. One connection is borrowed per request
/// and returned on every exit path by sqlx.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
    let url = config
        .url
        .as_deref()
        .ok_or(StorageError::ConfigMissing("DATABASE_URL or PG_CONNECT"))?;
    let target = redacted(url)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    info!("Created database pool for: {}", target);
    Ok(pool)
}

/// Connection URL safe for logs
fn redacted(url: &str) -> Result<String, StorageError> {
    let mut parsed = url::Url::parse(url).map_err(|_| StorageError::InvalidDatabaseUrl)?;
    if parsed.password().is_some() {
        let _ = parsed.set_password(Some("***"));
    }
    Ok(parsed.into())
}
