//! Core handler service.
//!
//! [`HandlerService<H, T>`] wraps a single handler and implements
//! `tower::Service<Arc<Request>>`. Cross-cutting concerns such as panic
//! recovery are stacked on top as ordinary tower layers.

use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use chime_core::{Message, Request};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::{BoxError, Service};

use super::traits::Handler;

// ============================================================================
// HandlerResponse
// ============================================================================

/// A type that can be returned from handlers.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    /// Performs the side effects of this response, such as sending a reply.
    async fn respond(self, req: &Request) -> Result<(), BoxError>;
}

#[async_trait]
impl HandlerResponse for () {
    async fn respond(self, _req: &Request) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Sent back with [`Request::reply`].
#[async_trait]
impl HandlerResponse for String {
    async fn respond(self, req: &Request) -> Result<(), BoxError> {
        req.reply(self).await?;
        Ok(())
    }
}

/// Written as-is.
#[async_trait]
impl HandlerResponse for Message {
    async fn respond(self, req: &Request) -> Result<(), BoxError> {
        req.write(self).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn respond(self, req: &Request) -> Result<(), BoxError> {
        match self {
            Some(t) => t.respond(req).await,
            None => Ok(()),
        }
    }
}

/// On `Err`, the error is handed to the mux, which logs it.
#[async_trait]
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<BoxError> + Send + 'static,
{
    async fn respond(self, req: &Request) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.respond(req).await,
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// HandlerService
// ============================================================================

/// A tower [`Service`] that calls a single generic handler.
pub struct HandlerService<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> HandlerService<H, T> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H: Clone, T> Clone for HandlerService<H, T> {
    fn clone(&self) -> Self {
        HandlerService {
            handler: self.handler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, T> Service<Arc<Request>> for HandlerService<H, T>
where
    H: Handler<T>,
{
    type Response = ();
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<(), Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Arc<Request>) -> Self::Future {
        let handler = self.handler.clone();
        async move { handler.call(req).await }.boxed()
    }
}
