//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware layers wrap
//! the lookup, so every request, matched or not, flows through them.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, Handler, HandlerResult};
use crate::middleware::{BoxedMiddleware, Endpoint, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so they chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Arc<Vec<BoxedMiddleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Arc::new(Vec::new()) }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Shorthand for `on(Method::GET, path, handler)`.
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Appends a middleware layer. The first layer added is the outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        Arc::make_mut(&mut self.layers).push(Arc::new(middleware));
        self
    }

    /// Runs `req` through the middleware chain and the matched handler.
    ///
    /// Unmatched requests resolve to `404 Not Found`. Handler errors come back
    /// as `Err`, untouched by the router.
    pub fn handle(&self, req: Request) -> BoxFuture<HandlerResult> {
        let endpoint: Endpoint = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => Box::new(move |mut req: Request| {
                req.params = params;
                handler.call(req)
            }),
            None => Box::new(|_req: Request| -> BoxFuture<HandlerResult> {
                Box::pin(async { Ok(Response::status(StatusCode::NOT_FOUND)) })
            }),
        };

        Next::new(Arc::clone(&self.layers), endpoint).run(req)
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
