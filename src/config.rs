//! Configuration management

use anyhow::{Context, Result};

use crate::defaults::DEFAULT_DATABASE_MAX_CONNECTIONS;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Optional NATS credentials, used only when both are set
    pub nats_user: Option<String>,
    pub nats_password: Option<String>,

    /// PostgreSQL connection string
    pub database_url: String,

    pub database_max_connections: u32,

    /// Directory for the daily rolling log files
    pub logs_dir: String,

    /// Default filter when RUST_LOG is not set
    pub log_filter: String,

    /// Emit stdout logs as JSON lines
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let nats_url = non_empty("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string());

        let database_url = non_empty("DATABASE_URL").context("DATABASE_URL must be set")?;

        let database_max_connections = match non_empty("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be a positive integer, got {value:?}"))?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };
        if database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            nats_url,
            nats_user: non_empty("NATS_USER"),
            nats_password: non_empty("NATS_PASSWORD"),
            database_url,
            database_max_connections,
            logs_dir: non_empty("LOGS_DIR").unwrap_or_else(|| "./logs".to_string()),
            log_filter: non_empty("RUST_LOG").unwrap_or_else(|| "info,dispatch_worker=debug".to_string()),
            json_logs: non_empty("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Credentials pair when both user and password are configured
    pub fn nats_credentials(&self) -> Option<(String, String)> {
        match (&self.nats_user, &self.nats_password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://test")]).unwrap();

        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.logs_dir, "./logs");
        assert_eq!(config.log_filter, "info,dispatch_worker=debug");
        assert!(!config.json_logs);
        assert!(config.nats_credentials().is_none());
    }

    #[test]
    fn test_config_requires_database_url() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        assert!(config_from(&[("DATABASE_URL", "")]).is_err());
    }

    #[test]
    fn test_config_max_connections() {
        let config = config_from(&[("DATABASE_URL", "postgres://test"), ("DATABASE_MAX_CONNECTIONS", "25")]).unwrap();
        assert_eq!(config.database_max_connections, 25);

        assert!(config_from(&[("DATABASE_URL", "postgres://test"), ("DATABASE_MAX_CONNECTIONS", "lots")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://test"), ("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
    }

    #[test]
    fn test_config_nats_credentials_need_both() {
        let only_user = config_from(&[("DATABASE_URL", "postgres://test"), ("NATS_USER", "dispatch")]).unwrap();
        assert!(only_user.nats_credentials().is_none());

        let both = config_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("NATS_USER", "dispatch"),
            ("NATS_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(both.nats_credentials(), Some(("dispatch".to_string(), "secret".to_string())));
    }

    #[test]
    fn test_config_json_logs() {
        let config = config_from(&[("DATABASE_URL", "postgres://test"), ("LOG_FORMAT", "JSON")]).unwrap();
        assert!(config.json_logs);
    }
}
