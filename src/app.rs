//! Application factory.

use serde::Serialize;

use crate::db::DbClient;
use crate::health;
use crate::middleware::trace::RequestLogger;
use crate::request::Request;
use crate::response::Json;
use crate::router::Router;

/// Paths kept out of the request log.
pub const UNLOGGED_ROUTES: [&str; 2] = ["/healthz", "/readyz"];

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

/// `GET /`
async fn root(_req: Request) -> Json<Message> {
    Json(Message { message: "Hello World" })
}

/// Builds the application router.
///
/// Registers `GET /`, the health probes, and request logging. With a
/// database attached, `/readyz` reports ready only while it answers.
pub fn create_app(db: Option<DbClient>) -> Router {
    let router = Router::new()
        .get("/", root)
        .get("/healthz", health::liveness);

    let router = match db {
        Some(db) => router.get("/readyz", health::readiness_with_db(db)),
        None => router.get("/readyz", health::readiness),
    };

    router.layer(RequestLogger::new().skip_routes(UNLOGGED_ROUTES))
}
