//! The [`Handler`] trait.
//!
//! Handlers are plain async functions whose parameters implement
//! [`FromRequest`] and whose return type implements [`HandlerResponse`],
//! similar to Axum's handler system.
//!
//! ```rust,ignore
//! // No parameters, no response
//! async fn tick() {}
//!
//! // Extractors in, reply out
//! async fn echo(Trailing(text): Trailing) -> String {
//!     text
//! }
//!
//! // Fallible handlers have their errors logged by the mux
//! async fn fetch(req: Arc<Request>) -> Result<String, BoxError> {
//!     Ok(lookup(req.message()).await?)
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chime_core::Request;
use tower::BoxError;
use tracing::trace;

use super::service::HandlerResponse;
use crate::extractor::FromRequest;

/// An async function that can handle a [`Request`].
///
/// Implemented for async functions and closures taking up to 8 parameters
/// that implement [`FromRequest`].
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Calls the handler, extracting its parameters from `req`.
    async fn call(self, req: Arc<Request>) -> Result<(), BoxError>;
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse,
            $( $ty: FromRequest + Send + 'static, )*
        {
            async fn call(self, req: Arc<Request>) -> Result<(), BoxError> {
                $(
                    let $ty = match $ty::from_request(&req) {
                        Ok(value) => value,
                        Err(err) => {
                            trace!(request_id = %req.id(), error = %err, "handler skipped");
                            return Ok(());
                        }
                    };
                )*

                let res = (self)($($ty,)*).await;
                res.respond(&req).await
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
