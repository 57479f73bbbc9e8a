//! Dispatch for messages addressed to the bot by nick.

use std::sync::Arc;

use chime_core::{Capability, Request};
use parking_lot::RwLock;

use super::basic::run_handlers;
use crate::handler::{BoxedHandler, Handler, into_boxed_handler};

/// Runs handlers for messages of the form `chime: some text`.
///
/// Handlers see the text after the mention as the trailing parameter.
#[derive(Default)]
pub struct MentionMux {
    handlers: RwLock<Vec<BoxedHandler>>,
}

impl MentionMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn event<H, T>(&self, handler: H)
    where
        H: Handler<T>,
        T: 'static,
    {
        self.handlers.write().push(into_boxed_handler(handler));
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn dispatch(&self, req: Arc<Request>) {
        let _timer = req.timer("mention_mux");

        let Some(text) = req.message().user_text() else {
            return;
        };
        let nick = req.bot().current_nick();
        let Some(stripped) = strip_mention(text, &nick) else {
            return;
        };

        let mut copy = req.copy();
        copy.message_mut().set_trailing(stripped.to_string());
        let copy = Arc::new(copy);

        let handlers = self.handlers.read().clone();
        run_handlers(handlers, &copy, "mention").await;
    }
}

impl Capability for MentionMux {
    const ID: &'static str = "core.mention_mux";
}

/// Returns the trimmed text after `nick`, one ASCII punctuation character
/// and a space.
pub fn strip_mention<'a>(text: &'a str, nick: &str) -> Option<&'a str> {
    if nick.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(nick)?;
    let mut chars = rest.chars();
    let punct = chars.next()?;
    if !punct.is_ascii_punctuation() {
        return None;
    }
    chars.as_str().strip_prefix(' ').map(str::trim)
}
