//! Database connection management.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::{Config, DatabaseSource};
use crate::secrets::DatabaseCredentials;
use crate::{Error, Result};

/// Build connection options. Host, port and database name in the secret win
/// over the environment when present.
///
/// Credentials are set field by field rather than spliced into a URL, so
/// passwords may contain `@`, `:`, `/` or `#`.
pub fn connect_options(
    source: &DatabaseSource,
    credentials: Option<&DatabaseCredentials>,
) -> Result<PgConnectOptions> {
    match (source, credentials) {
        (DatabaseSource::Url(url), _) => Ok(url.parse::<PgConnectOptions>()?),
        (
            DatabaseSource::Secret {
                host, port, name, ..
            },
            Some(creds),
        ) => Ok(PgConnectOptions::new()
            .host(creds.host.as_deref().unwrap_or(host))
            .port(creds.port.unwrap_or(*port))
            .username(&creds.username)
            .password(&creds.password)
            .database(creds.dbname.as_deref().unwrap_or(name))),
        (DatabaseSource::Secret { .. }, None) => Err(Error::Config(
            "database credentials are required without DATABASE_URL".to_string(),
        )),
    }
}

/// Create a database connection pool.
pub async fn create_pool(
    config: &Config,
    credentials: Option<&DatabaseCredentials>,
) -> Result<PgPool> {
    let options = connect_options(&config.database, credentials)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}
