//! Extractor system for the Chime framework.
//!
//! Types implementing [`FromRequest`] can be used directly as handler
//! parameters. When an extractor fails, the handler is skipped for that
//! request.
//!
//! ```rust,ignore
//! async fn greet(Sender(nick): Sender, Trailing(text): Trailing) -> String {
//!     format!("{nick} said {text}")
//! }
//! ```

use std::sync::Arc;

use chime_core::{BotHandle, Message, Request};

use crate::error::{ExtractError, ExtractResult};

/// A type that can be extracted from a [`Request`].
pub trait FromRequest: Sized {
    /// Attempts to extract this type from the request.
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self>;
}

impl FromRequest for Arc<Request> {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        Ok(Arc::clone(req))
    }
}

impl FromRequest for Message {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        Ok(req.message().clone())
    }
}

impl FromRequest for BotHandle {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        Ok(Arc::clone(req.bot()))
    }
}

/// Optional parameters never skip the handler.
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        Ok(T::from_request(req).ok())
    }
}

/// The trailing parameter of the message.
///
/// Inside command and mention handlers this is the text after the command
/// word or the mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailing(pub String);

impl FromRequest for Trailing {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        req.message()
            .trailing()
            .map(|t| Trailing(t.to_string()))
            .ok_or(ExtractError::MissingTrailing)
    }
}

/// The trailing parameter split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args(pub Vec<String>);

impl FromRequest for Args {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        let Trailing(text) = Trailing::from_request(req)?;
        Ok(Args(text.split_whitespace().map(String::from).collect()))
    }
}

/// The sender's nick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender(pub String);

impl FromRequest for Sender {
    fn from_request(req: &Arc<Request>) -> ExtractResult<Self> {
        req.sender()
            .map(|s| Sender(s.to_string()))
            .ok_or(ExtractError::MissingSender)
    }
}
