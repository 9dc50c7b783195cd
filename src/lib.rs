//! # tsu-app
//!
//! A small HTTP service scaffold: one router, one request-logging
//! middleware, one PostgreSQL client. Business logic goes on top.
//!
//! - **HTTP** — radix-tree routing via [`matchit`], hyper 1 with HTTP/1.1 and
//!   HTTP/2, graceful shutdown on SIGTERM / Ctrl-C.
//! - **Request logging** — [`middleware::trace::RequestLogger`] emits start,
//!   end and error events per request, with path prefix / regex skip filters.
//! - **Database** — [`db::DbClient`] pools `tokio-postgres` connections,
//!   builds its connection settings from [`db::DbConfig`], and logs whether
//!   the connection is encrypted.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tsu_app::{AppConfig, Server, create_app, db};
//!
//! #[tokio::main]
//! async fn main() -> tsu_app::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let db = db::init(config.check_db_connection).await?;
//!
//!     Server::bind(config.addr().await?).serve(create_app(Some(db))).await
//! }
//! ```

mod app;
mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod db;
pub mod health;
pub mod middleware;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use app::{UNLOGGED_ROUTES, create_app};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use handler::{BoxError, BoxFuture, Handler, HandlerResult, IntoHandlerResult};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
