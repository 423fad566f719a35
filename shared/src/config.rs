use std::env;

use crate::error::StoreError;

/// Connection settings for the shared `users` database, supplied by the
/// execution environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub require_tls: bool,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        let port = match env::var("DB_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| StoreError::Config(format!("invalid DB_PORT value: {raw}")))?,
            Err(_) => 5432,
        };

        Ok(Self {
            host: required("DB_HOST")?,
            port,
            name: required("DB_NAME")?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            require_tls: env::var("DB_USE_SSL").map(|v| is_truthy(&v)).unwrap_or(false),
        })
    }
}

fn required(key: &str) -> Result<String, StoreError> {
    env::var(key).map_err(|_| StoreError::Config(format!("{key} must be set")))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "require"
    )
}
