//! Database settings read from the environment.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// TLS negotiation mode, mirroring the libpq `sslmode` values this client supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Plaintext only.
    Disable,
    /// Try TLS, fall back to plaintext if the server refuses it.
    #[default]
    Prefer,
    /// TLS or nothing.
    Require,
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disable => write!(f, "disable"),
            Self::Prefer => write!(f, "prefer"),
            Self::Require => write!(f, "require"),
        }
    }
}

impl FromStr for SslMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            _ => Err(Error::Config(format!(
                "invalid DB_SSL_MODE '{s}': expected disable, prefer, or require"
            ))),
        }
    }
}

/// Connection settings for the application database.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub name: String,
    pub username: String,
    pub password: Option<String>,
    pub db_schema: String,
    pub port: String,
    pub ssl_mode: SslMode,
}

impl DbConfig {
    /// Reads `DB_HOST`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_SCHEMA`,
    /// `DB_PORT` and `DB_SSL_MODE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    ///
    /// An empty `DB_PASSWORD` counts as no password.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let ssl_mode = match lookup("DB_SSL_MODE") {
            Some(mode) => mode.parse()?,
            None => SslMode::default(),
        };

        Ok(Self {
            host: required("DB_HOST")?,
            name: required("DB_NAME")?,
            username: required("DB_USER")?,
            password: lookup("DB_PASSWORD").filter(|p| !p.is_empty()),
            db_schema: lookup("DB_SCHEMA").unwrap_or_else(|| "public".to_owned()),
            port: lookup("DB_PORT").unwrap_or_else(|| "5432".to_owned()),
            ssl_mode,
        })
    }
}

/// Reads the database config from the process environment.
pub fn get_db_config() -> Result<DbConfig> {
    DbConfig::from_env()
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db_schema", &self.db_schema)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn reads_all_fields() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DB_HOST", "db.internal"),
            ("DB_NAME", "app"),
            ("DB_USER", "app_user"),
            ("DB_PASSWORD", "secret"),
            ("DB_SCHEMA", "app"),
            ("DB_PORT", "6432"),
            ("DB_SSL_MODE", "require"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.name, "app");
        assert_eq!(config.username, "app_user");
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.db_schema, "app");
        assert_eq!(config.port, "6432");
        assert_eq!(config.ssl_mode, SslMode::Require);
    }

    #[test]
    fn optional_fields_default() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DB_HOST", "localhost"),
            ("DB_NAME", "app"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", ""),
        ]))
        .unwrap();

        assert_eq!(config.password, None);
        assert_eq!(config.db_schema, "public");
        assert_eq!(config.port, "5432");
        assert_eq!(config.ssl_mode, SslMode::Prefer);
    }

    #[test]
    fn missing_required_field_is_config_error() {
        let err = DbConfig::from_lookup(lookup(&[("DB_HOST", "localhost")])).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: DB_NAME must be set");
    }

    #[test]
    fn invalid_ssl_mode_is_rejected() {
        assert!("verify-full".parse::<SslMode>().is_err());
        assert_eq!("disable".parse::<SslMode>().unwrap(), SslMode::Disable);
    }

    #[test]
    fn debug_redacts_password() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DB_HOST", "localhost"),
            ("DB_NAME", "app"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "hunter2"),
        ]))
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
