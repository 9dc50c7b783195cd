//! Handler trait and type erasure.
//!
//! The router holds handlers of *different* types in one table, so each
//! handler is hidden behind `dyn ErasedHandler` and stored uniformly:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.on(Method::GET, "/", hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                       ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req).await.into_handler_result() })
//! ```
//!
//! Handlers may be fallible. A handler returning `Result<_, E>` hands its
//! error to the middleware chain as a [`BoxError`]; the server answers it with
//! a bare `500 Internal Server Error`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Any error a handler can fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What every handler and middleware ultimately produces.
pub type HandlerResult = Result<Response, BoxError>;

/// A heap-allocated, type-erased future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ── Handler outcomes ──────────────────────────────────────────────────────────

/// Conversion from a handler's return value into a [`HandlerResult`].
///
/// Implemented for everything that is [`IntoResponse`] (infallible) and for
/// `Result<T, E>` where `T: IntoResponse` and `E` converts into a [`BoxError`].
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl<T: IntoResponse> IntoHandlerResult for T {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self.into_response())
    }
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<HandlerResult>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Automatically satisfied by any function or closure with the shape:
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoHandlerResult>
/// ```
///
/// Closures let handlers capture shared state, e.g. a cloned
/// [`DbClient`](crate::db::DbClient). The trait is sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<HandlerResult> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_handler_result() })
    }
}
