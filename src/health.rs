//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the service take traffic? Failure → pulled from the load balancer. |
//!
//! [`create_app`](crate::create_app) registers both and keeps them out of
//! the request log.

use http::StatusCode;
use tracing::warn;

use crate::db::DbClient;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe for a service without dependencies. Always `200 OK`.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}

/// Readiness probe gated on the database answering `SELECT 1`.
///
/// Returns `503 Service Unavailable` while the database is unreachable.
pub fn readiness_with_db(db: DbClient) -> impl Handler {
    move |_req: Request| {
        let db = db.clone();
        async move {
            match db.ping().await {
                Ok(()) => Response::text("ready"),
                Err(e) => {
                    warn!("readiness check failed: {e}");
                    Response::status(StatusCode::SERVICE_UNAVAILABLE)
                }
            }
        }
    }
}
