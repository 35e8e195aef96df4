//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// Where database connection details come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseSource {
    /// A complete connection URL, used as-is.
    Url(String),
    /// Host and name from the environment, credentials from Secrets Manager.
    Secret {
        host: String,
        port: u16,
        name: String,
        secret_arn: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseSource,
    /// Upper bound on pooled connections per Lambda instance
    pub max_connections: u32,
    /// AWS region
    pub aws_region: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::Config(format!("{key} not set")))
        };

        let database = match lookup("DATABASE_URL") {
            Some(url) => DatabaseSource::Url(url),
            None => DatabaseSource::Secret {
                host: required("DATABASE_HOST")?,
                port: parse_or("DATABASE_PORT", lookup("DATABASE_PORT"), 5432)?,
                name: lookup("DATABASE_NAME").unwrap_or_else(|| "salon".to_string()),
                secret_arn: required("DATABASE_SECRET_ARN")?,
            },
        };

        Ok(Self {
            database,
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                lookup("DATABASE_MAX_CONNECTIONS"),
                5,
            )?,
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("DATABASE_HOST", "ignored"),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseSource::Url("postgres://localhost/salon".to_string())
        );
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.aws_region, "us-east-1");
    }

    #[test]
    fn test_secret_source_requires_host_and_arn() {
        let err = Config::from_lookup(lookup(&[("DATABASE_HOST", "db.internal")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_SECRET_ARN"));

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_SECRET_ARN", "arn:aws:secretsmanager:us-east-1:1:secret:db"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 2);
        match config.database {
            DatabaseSource::Secret { host, port, name, .. } => {
                assert_eq!(host, "db.internal");
                assert_eq!(port, 5432);
                assert_eq!(name, "salon");
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_numeric_pool_size() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/salon"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
