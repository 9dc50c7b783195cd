//! Application-level behaviour through the public API.

use http::{Method, StatusCode};
use tracing::Level;
use tsu_app::middleware::trace::RequestLogger;
use tsu_app::test_util::capture;
use tsu_app::{Request, Response, Router, create_app};

#[tokio::test]
async fn root_endpoint_and_request_log() {
    let (logs, _guard) = capture();
    let app = create_app(None);

    let res = app.handle(Request::new(Method::GET, "/")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), br#"{"message":"Hello World"}"#);

    let messages = logs.messages();
    assert_eq!(messages.first().map(String::as_str), Some("start request"));
    assert_eq!(messages.last().map(String::as_str), Some("end request"));
}

#[tokio::test]
async fn health_probes_answer_without_database() {
    let app = create_app(None);

    let live = app.handle(Request::new(Method::GET, "/healthz")).await.unwrap();
    assert_eq!(live.body(), b"ok");

    let ready = app.handle(Request::new(Method::GET, "/readyz")).await.unwrap();
    assert_eq!(ready.body(), b"ready");
}

#[tokio::test]
async fn downstream_failure_reaches_the_caller() {
    #[derive(Debug)]
    struct Unavailable;

    impl std::fmt::Display for Unavailable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("upstream unavailable")
        }
    }

    impl std::error::Error for Unavailable {}

    async fn flaky(_req: Request) -> Result<Response, Unavailable> {
        Err(Unavailable)
    }

    let (logs, _guard) = capture();
    let app = Router::new().get("/flaky", flaky).layer(RequestLogger::new());

    let err = app.handle(Request::new(Method::GET, "/flaky")).await.unwrap_err();
    assert!(err.downcast_ref::<Unavailable>().is_some());

    let errors: Vec<_> = logs.at(Level::ERROR).into_iter().map(|e| e.message).collect();
    assert_eq!(errors, vec!["request failed with exception /flaky, method=GET"]);
}
