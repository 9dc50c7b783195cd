//! Reporting whether a database connection is encrypted.

use tokio_postgres::Client;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// TLS details of an established connection.
pub trait ConnectionInfo {
    /// Whether the connection negotiated TLS.
    fn ssl_in_use(&self) -> bool;

    /// Names of the attributes this connection can report, in reporting order.
    fn ssl_attribute_names(&self) -> &[String];

    /// Looks up one attribute. Names not listed by
    /// [`ssl_attribute_names`](Self::ssl_attribute_names) fail with
    /// [`Error::SslAttributeLookup`].
    fn ssl_attribute(&self, name: &str) -> Result<&str>;
}

/// TLS details as reported by the server for a live session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslInfo {
    in_use: bool,
    names: Vec<String>,
    values: Vec<String>,
}

impl SslInfo {
    /// Builds the info from ordered `(name, value)` pairs.
    pub fn new<I, K, V>(in_use: bool, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (names, values) = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { in_use, names, values }
    }

    /// Asks the server about the TLS state of `client`'s own backend.
    ///
    /// Reads `pg_stat_ssl` for `pg_backend_pid()`; attributes the server
    /// leaves null are not reported.
    pub async fn query(client: &Client) -> Result<Self> {
        let row = client
            .query_opt(
                "SELECT ssl, version, bits, cipher FROM pg_stat_ssl WHERE pid = pg_backend_pid()",
                &[],
            )
            .await?;

        let Some(row) = row else {
            return Ok(Self::default());
        };
        if !row.try_get::<_, bool>("ssl")? {
            return Ok(Self::default());
        }

        let protocol: Option<String> = row.try_get("version")?;
        let key_bits: Option<i32> = row.try_get("bits")?;
        let cipher: Option<String> = row.try_get("cipher")?;

        let attributes = [
            ("protocol", protocol),
            ("key_bits", key_bits.map(|b| b.to_string())),
            ("cipher", cipher),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)));

        Ok(Self::new(true, attributes))
    }
}

impl ConnectionInfo for SslInfo {
    fn ssl_in_use(&self) -> bool {
        self.in_use
    }

    fn ssl_attribute_names(&self) -> &[String] {
        &self.names
    }

    fn ssl_attribute(&self, name: &str) -> Result<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i].as_str())
            .ok_or_else(|| Error::SslAttributeLookup(name.to_owned()))
    }
}

/// Logs whether `conn_info` is encrypted.
///
/// With TLS in use, one INFO event lists every reported attribute as
/// `name value`, in the order the connection reports them. Without TLS, a
/// WARN event says so. Lookup failures are returned, not logged.
pub fn verify_ssl(conn_info: &impl ConnectionInfo) -> Result<()> {
    if !conn_info.ssl_in_use() {
        warn!("database connection is not using SSL");
        return Ok(());
    }

    let attributes = conn_info
        .ssl_attribute_names()
        .iter()
        .map(|name| -> Result<String> {
            Ok(format!("{name} {}", conn_info.ssl_attribute(name)?))
        })
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    info!("database connection is using SSL: {attributes}");
    Ok(())
}
