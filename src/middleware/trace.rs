//! Request logging middleware.
//!
//! Every request that is not skipped produces:
//!
//! | Event | Level | Fields |
//! |---|---|---|
//! | `start request` | INFO | `method`, `path` |
//! | `response received` | DEBUG | `status_code` |
//! | `end request` | INFO | `status_code`, `content_length`, `content_type`, `time_ms` |
//!
//! or, when the handler fails, `start request` followed by a single ERROR
//! event carrying `path`, `method` and `error`. The failure is then returned
//! to the caller exactly as the handler produced it. A panic gets the same
//! ERROR event, with the panic message as `error`, and then keeps unwinding.
//!
//! Health probes and similar high-frequency routes can be excluded with path
//! prefixes ([`RequestLogger::skip_routes`]) or regexes matched from the start
//! of the path ([`RequestLogger::skip_regexes`]).

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use futures::FutureExt;
use regex::Regex;
use tracing::{Instrument, Span, debug, error, info};

use crate::error::{Error, Result};
use crate::handler::{BoxFuture, HandlerResult};
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Logs the lifecycle of each request.
///
/// ```rust
/// use tsu_app::Router;
/// use tsu_app::middleware::trace::RequestLogger;
///
/// # fn build() -> tsu_app::Result<Router> {
/// let logger = RequestLogger::new()
///     .skip_routes(["/healthz", "/readyz"])
///     .skip_regexes([r"/static/.*\.css"])?;
///
/// let app = Router::new().layer(logger);
/// # Ok(app)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestLogger {
    skip_routes: Vec<String>,
    skip_regexes: Vec<Regex>,
    span: Span,
}

impl RequestLogger {
    /// A logger with no skip filters, emitting into the caller's current span.
    pub fn new() -> Self {
        Self { skip_routes: Vec::new(), skip_regexes: Vec::new(), span: Span::none() }
    }

    /// Skips every request whose path starts with one of `routes`.
    pub fn skip_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_routes.extend(routes.into_iter().map(Into::into));
        self
    }

    /// Skips every request whose path matches one of `patterns` at its start.
    ///
    /// Patterns are anchored at the beginning of the path only, so `/static`
    /// matches `/static/app.css` but not `/assets/static`.
    pub fn skip_regexes<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let re = Regex::new(&format!("^(?:{pattern})"))
                .map_err(|e| Error::Config(format!("invalid skip regex `{pattern}`: {e}")))?;
            self.skip_regexes.push(re);
        }
        Ok(self)
    }

    /// Emits every event for a logged request inside `span`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether `path` bypasses logging.
    pub fn should_skip(&self, path: &str) -> bool {
        self.skip_routes.iter().any(|route| path.starts_with(route.as_str()))
            || self.skip_regexes.iter().any(|re| re.is_match(path))
    }
}

impl Default for RequestLogger {
    fn default() -> Self { Self::new() }
}

impl Middleware for RequestLogger {
    fn call(&self, req: Request, next: Next) -> BoxFuture<HandlerResult> {
        if self.should_skip(req.path()) {
            return next.run(req);
        }

        Box::pin(log_request(req, next).instrument(self.span.clone()))
    }
}

async fn log_request(req: Request, next: Next) -> HandlerResult {
    let method = req.method().clone();
    let path = req.path().to_owned();
    let start = Instant::now();

    info!(%method, %path, "start request");

    let outcome = AssertUnwindSafe(async move { next.run(req).await })
        .catch_unwind()
        .await;

    let res = match outcome {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => {
            error!(%path, %method, error = %e, "request failed with exception {path}, method={method}");
            return Err(e);
        }
        Err(payload) => {
            let reason = panic_message(&*payload);
            error!(%path, %method, error = reason, "request failed with exception {path}, method={method}");
            panic::resume_unwind(payload);
        }
    };

    debug!(status_code = res.status_code().as_u16(), "response received");

    let time_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        status_code = res.status_code().as_u16(),
        content_length = res.content_length(),
        content_type = res.content_type().unwrap_or_default(),
        time_ms,
        "end request"
    );

    Ok(res)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic")
}
