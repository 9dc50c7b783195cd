//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, metrics, request-id injection,
//! and authentication-header inspection.
//!
//! A middleware is a plain `(Request, Next) -> HandlerResult` function behind
//! the [`Middleware`] trait. Register it with [`Router::layer`](crate::Router::layer);
//! layers run in registration order, outermost first, and wrap route lookup
//! so unmatched requests (404) pass through them too.
//!
//! Built-in middleware:
//! - [`trace`] — per-request start/end/error events with status and latency

pub mod trace;

use std::sync::Arc;

use crate::handler::{BoxFuture, HandlerResult};
use crate::request::Request;

/// A request interceptor.
///
/// Call `next.run(req)` to continue down the chain, or return a response
/// without calling it to short-circuit. Errors returned by `next` should be
/// propagated unchanged unless the middleware exists to translate them.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture<HandlerResult>;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The innermost step of the chain: route lookup plus the matched handler.
pub(crate) type Endpoint = Box<dyn FnOnce(Request) -> BoxFuture<HandlerResult> + Send>;

/// The rest of the middleware chain, ending in the routed handler.
pub struct Next {
    layers: Arc<Vec<BoxedMiddleware>>,
    position: usize,
    endpoint: Endpoint,
}

impl Next {
    pub(crate) fn new(layers: Arc<Vec<BoxedMiddleware>>, endpoint: Endpoint) -> Self {
        Self { layers, position: 0, endpoint }
    }

    /// Runs the remaining layers and then the handler.
    pub fn run(self, req: Request) -> BoxFuture<HandlerResult> {
        let Next { layers, position, endpoint } = self;
        let layer = layers.get(position).cloned();
        match layer {
            Some(layer) => layer.call(req, Next { layers, position: position + 1, endpoint }),
            None => endpoint(req),
        }
    }
}
