//! Verb-keyed dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use chime_core::{Capability, Request};
use parking_lot::RwLock;
use tower::ServiceExt;
use tracing::{debug, error};

use crate::handler::{BoxedHandler, Handler, into_boxed_handler};

/// Verb matching every message.
pub const WILDCARD: &str = "*";

/// Maps a protocol verb to an ordered list of handlers.
///
/// Verbs compare exactly as given. Handlers registered under [`WILDCARD`]
/// run for every message, before the verb's own handlers.
///
/// # Example
///
/// ```rust,ignore
/// let mux = BasicMux::new();
/// mux.event("*", log_everything);
/// mux.event("JOIN", greet_joiner);
/// ```
#[derive(Default)]
pub struct BasicMux {
    handlers: RwLock<HashMap<String, Vec<BoxedHandler>>>,
}

impl BasicMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for `verb`.
    pub fn event<H, T>(&self, verb: impl Into<String>, handler: H)
    where
        H: Handler<T>,
        T: 'static,
    {
        self.event_boxed(verb, into_boxed_handler(handler));
    }

    /// Appends an already boxed handler for `verb`.
    pub fn event_boxed(&self, verb: impl Into<String>, handler: BoxedHandler) {
        self.handlers
            .write()
            .entry(verb.into())
            .or_default()
            .push(handler);
    }

    /// Returns the registered verbs, sorted.
    pub fn verbs(&self) -> Vec<String> {
        let mut verbs: Vec<_> = self.handlers.read().keys().cloned().collect();
        verbs.sort();
        verbs
    }

    /// Returns the number of handlers registered for `verb`.
    pub fn handler_count(&self, verb: &str) -> usize {
        self.handlers.read().get(verb).map_or(0, Vec::len)
    }

    /// Runs wildcard handlers, then the handlers for the message's verb.
    pub async fn dispatch(&self, req: Arc<Request>) {
        let verb = req.message().command.clone();
        let (wildcard, matched) = {
            let table = self.handlers.read();
            let wildcard = table.get(WILDCARD).cloned().unwrap_or_default();
            let matched = if verb == WILDCARD {
                Vec::new()
            } else {
                table.get(&verb).cloned().unwrap_or_default()
            };
            (wildcard, matched)
        };

        debug!(
            request_id = %req.id(),
            verb = %verb,
            wildcard = wildcard.len(),
            matched = matched.len(),
            "dispatching"
        );

        run_handlers(wildcard, &req, &verb).await;
        run_handlers(matched, &req, &verb).await;
    }
}

impl Capability for BasicMux {
    const ID: &'static str = "core.basic_mux";
}

/// Calls each handler in order, logging failures.
pub(crate) async fn run_handlers(handlers: Vec<BoxedHandler>, req: &Arc<Request>, verb: &str) {
    for handler in handlers {
        if let Err(err) = handler.oneshot(Arc::clone(req)).await {
            error!(request_id = %req.id(), verb = %verb, error = %err, "handler failed");
        }
    }
}
