//! Panic recovery for handler services.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use chime_core::Request;
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::{BoxError, Service};
use tower_layer::Layer;

use crate::error::HandlerPanicked;

/// Turns a panic inside the wrapped service into a [`HandlerPanicked`] error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchPanicLayer;

impl<S> Layer<S> for CatchPanicLayer {
    type Service = CatchPanicService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CatchPanicService(inner)
    }
}

/// Service produced by [`CatchPanicLayer`].
pub struct CatchPanicService<S>(S);

impl<S> Clone for CatchPanicService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        CatchPanicService(self.0.clone())
    }
}

impl<S> Service<Arc<Request>> for CatchPanicService<S>
where
    S: Service<Arc<Request>, Response = (), Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready(cx)
    }

    fn call(&mut self, req: Arc<Request>) -> Self::Future {
        let mut inner = self.0.clone();
        // The inner call runs inside the guarded future so a panic while
        // building the future is caught as well.
        let guarded = async move { inner.call(req).await };
        async move {
            match AssertUnwindSafe(guarded).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(HandlerPanicked {
                    message: panic_message(payload.as_ref()),
                }
                .into()),
            }
        }
        .boxed()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
