//! Handler and service system for the Chime framework.
//!
//! - **Handler** ([`traits`]): the [`Handler`] trait that adapts async
//!   functions with parameter extraction
//! - **Service** ([`service`]): [`HandlerService`] and [`HandlerResponse`]
//! - **Panic** ([`panic`]): [`CatchPanicLayer`], stacked on every handler
//!
//! Muxes store handlers as [`BoxedHandler`]s:
//!
//! ```text
//! async fn echo(..)            ← Handler<T>
//!     HandlerService::new      ← tower::Service<Arc<Request>>
//!     CatchPanicLayer          ← panics become HandlerPanicked errors
//!     BoxCloneSyncService      ← BoxedHandler
//! ```

pub mod panic;
pub mod service;
pub mod traits;

use std::sync::Arc;

use chime_core::Request;
use tower::BoxError;
use tower::util::BoxCloneSyncService;
use tower_layer::Layer;

pub use panic::{CatchPanicLayer, CatchPanicService};
pub use service::{HandlerResponse, HandlerService};
pub use traits::Handler;

/// A type-erased, panic-guarded handler service.
pub type BoxedHandler = BoxCloneSyncService<Arc<Request>, (), BoxError>;

/// Wraps a handler into a [`BoxedHandler`].
pub fn into_boxed_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    BoxCloneSyncService::new(CatchPanicLayer.layer(HandlerService::new(handler)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerPanicked;
    use crate::extractor::{Sender, Trailing};
    use crate::testing::{TestBot, privmsg_from};
    use tower::ServiceExt;

    async fn shout(Trailing(text): Trailing) -> String {
        text.to_uppercase()
    }

    async fn needs_sender(Sender(nick): Sender) -> String {
        format!("hi {nick}")
    }

    async fn fails() -> Result<(), BoxError> {
        Err("boom".into())
    }

    async fn panics() {
        panic!("handler exploded");
    }

    #[tokio::test]
    async fn test_string_response_replies() {
        let bot = TestBot::new("chime");
        let req = privmsg_from(&bot, "alice", "#chan", "hello");
        into_boxed_handler(shout).oneshot(req).await.unwrap();
        assert_eq!(bot.lines(), vec!["PRIVMSG #chan HELLO"]);
    }

    #[tokio::test]
    async fn test_failed_extraction_skips() {
        let bot = TestBot::new("chime");
        let req = Arc::new(Request::new(
            chime_core::Message::privmsg("#chan", "hello"),
            bot.clone(),
        ));
        into_boxed_handler(needs_sender).oneshot(req).await.unwrap();
        assert!(bot.lines().is_empty());
    }

    #[tokio::test]
    async fn test_error_is_returned() {
        let bot = TestBot::new("chime");
        let req = privmsg_from(&bot, "alice", "#chan", "hello");
        let err = into_boxed_handler(fails).oneshot(req).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let bot = TestBot::new("chime");
        let req = privmsg_from(&bot, "alice", "#chan", "hello");
        let err = into_boxed_handler(panics).oneshot(req).await.unwrap_err();
        let panicked = err.downcast_ref::<HandlerPanicked>().unwrap();
        assert_eq!(panicked.message, "handler exploded");
    }
}
