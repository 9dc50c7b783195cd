//! Process-level settings read from the environment.

use std::env;
use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::error::{Error, Result};

/// Where and how the HTTP server runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `local`, `dev`, `prod`, … Only used for logging.
    pub environment: String,
    /// Bind host. Containers need `0.0.0.0` to be reachable from outside.
    pub host: String,
    pub port: u16,
    /// Connect to the database at startup and log its SSL status.
    pub check_db_connection: bool,
}

impl AppConfig {
    /// Reads `ENVIRONMENT`, `HOST`, `PORT` and `DB_CHECK_CONNECTION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT `{port}`")))?,
            None => 8080,
        };

        let check_db_connection = match lookup("DB_CHECK_CONNECTION").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(Error::Config(format!("invalid DB_CHECK_CONNECTION `{other}`")));
            }
        };

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "local".to_owned()),
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            port,
            check_db_connection,
        })
    }

    /// The socket address to bind. `host` may be an IP literal or a name
    /// such as `localhost`; names bind to their first resolved address.
    pub async fn addr(&self) -> Result<SocketAddr> {
        let invalid = || Error::Config(format!("invalid bind address `{}:{}`", self.host, self.port));
        lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }
}
