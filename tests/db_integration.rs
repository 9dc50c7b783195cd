//! Database integration tests.
//!
//! Most of these need a running Postgres reachable through the `DB_*`
//! variables, e.g.:
//!
//! ```bash
//! export DB_HOST=localhost DB_NAME=app DB_USER=app DB_PASSWORD=secret
//! cargo test --test db_integration -- --ignored --nocapture
//! ```

use std::time::Duration;

use tracing::Level;
use tsu_app::Error;
use tsu_app::db::{self, DbClient, DbConfig, SslMode};
use tsu_app::test_util::capture;

#[tokio::test]
#[ignore] // Requires Postgres running
async fn connection_evaluates_select_1() {
    let db = db::init(false).await.expect("init");
    let conn = db.get_connection().await.expect("connection");

    assert_eq!(conn.scalar::<i32>("SELECT 1").await.expect("query"), 1);
}

#[tokio::test]
#[ignore] // Requires Postgres running
async fn session_transaction_evaluates_select_1() {
    let db = db::init(false).await.expect("init");
    let mut session = db.get_session().await.expect("session");

    let tx = session.begin().await.expect("begin");
    assert_eq!(tx.scalar::<i32>("SELECT 1").await.expect("query"), 1);
    tx.commit().await.expect("commit");
}

#[tokio::test]
#[ignore] // Requires Postgres running
async fn dropped_transaction_rolls_back() {
    let db = db::init(false).await.expect("init");
    let mut session = db.get_session().await.expect("session");

    let tx = session.begin().await.expect("begin");
    tx.execute("CREATE TEMP TABLE rollback_check (id int)").await.expect("create");
    tx.commit().await.expect("commit");

    {
        let tx = session.begin().await.expect("begin");
        tx.execute("INSERT INTO rollback_check VALUES (1)").await.expect("insert");
        // dropped without commit
    }

    let tx = session.begin().await.expect("begin");
    let rows: i64 = tx.scalar("SELECT count(*) FROM rollback_check").await.expect("count");
    assert_eq!(rows, 0);
}

#[tokio::test]
#[ignore] // Requires Postgres running
async fn connection_check_logs_ssl_status() {
    let (logs, _guard) = capture();

    db::init(true).await.expect("init");

    let ssl_event = logs
        .events()
        .into_iter()
        .find(|e| e.message.starts_with("database connection is"))
        .expect("ssl status logged");

    if ssl_event.message == "database connection is not using SSL" {
        assert_eq!(ssl_event.level, Level::WARN);
    } else {
        assert!(ssl_event.message.starts_with("database connection is using SSL: protocol "));
        assert_eq!(ssl_event.level, Level::INFO);
    }
}

#[tokio::test]
#[ignore] // Requires Postgres running
async fn cancelled_work_returns_connections_to_the_pool() {
    let db = db::init(false).await.expect("init");

    // More cancellations than the pool has slots.
    for _ in 0..40 {
        let db = db.clone();
        let work = async move {
            let mut session = db.get_session().await?;
            let tx = session.begin().await?;
            tx.execute("SELECT pg_sleep(5)").await?;
            tx.commit().await
        };
        let cancelled = tokio::time::timeout(Duration::from_millis(50), work).await;
        assert!(cancelled.is_err(), "work should still be sleeping");
    }

    let conn = tokio::time::timeout(Duration::from_secs(10), db.get_connection())
        .await
        .expect("checkout after cancellations")
        .expect("connection");
    assert_eq!(conn.scalar::<i32>("SELECT 1").await.expect("query"), 1);
}

#[tokio::test]
#[ignore] // Requires Postgres running
async fn readiness_probe_reports_ready() {
    use http::{Method, StatusCode};
    use tsu_app::{Request, create_app};

    let db = db::init(false).await.expect("init");
    let app = create_app(Some(db));

    let res = app.handle(Request::new(Method::GET, "/readyz")).await.expect("handle");
    assert_eq!(res.status_code(), StatusCode::OK);
}

fn unreachable() -> DbConfig {
    DbConfig {
        host: "127.0.0.1".to_owned(),
        name: "app".to_owned(),
        username: "app".to_owned(),
        password: None,
        db_schema: "public".to_owned(),
        port: "1".to_owned(),
        ssl_mode: SslMode::Disable,
    }
}

#[tokio::test]
async fn unreachable_database_fails_init_with_connection_error() {
    let err = DbClient::new(&unreachable(), true).await.err().expect("init must fail");
    assert!(matches!(err, Error::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn lazy_pool_does_not_connect_at_init() {
    let db = DbClient::new(&unreachable(), false).await.expect("pool builds without connecting");
    assert!(matches!(db.get_connection().await, Err(Error::Connection(_))));
}
