//! Unified error type.

/// The error type returned by the crate's fallible operations.
///
/// Application-level outcomes (404, 503, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: configuration, database access, and socket I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The database could not be reached, or no pooled connection was available.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement sent to the database failed.
    #[error("query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// An SSL attribute was requested that the connection does not report.
    #[error("ssl attribute `{0}` is not reported by the connection")]
    SslAttributeLookup(String),

    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<deadpool_postgres::PoolError> for Error {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        Self::Connection(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
