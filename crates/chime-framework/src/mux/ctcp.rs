//! CTCP sub-command dispatch.

use std::sync::Arc;

use chime_core::{Capability, Request};

use super::basic::{BasicMux, WILDCARD};
use crate::handler::Handler;

/// Dispatches `\x01VERB args\x01` requests by upper-cased CTCP verb.
///
/// Handlers see the CTCP verb as the message command and the arguments as
/// the trailing parameter. Answer with [`Request::ctcp_reply`].
#[derive(Default)]
pub struct CtcpMux {
    inner: BasicMux,
}

impl CtcpMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for a CTCP verb, or for all of them with `"*"`.
    pub fn event<H, T>(&self, verb: &str, handler: H)
    where
        H: Handler<T>,
        T: 'static,
    {
        let verb = if verb == WILDCARD {
            WILDCARD.to_string()
        } else {
            verb.to_ascii_uppercase()
        };
        self.inner.event(verb, handler);
    }

    pub async fn dispatch(&self, req: Arc<Request>) {
        let _timer = req.timer("ctcp_mux");

        let Some((verb, args)) = req.message().ctcp() else {
            return;
        };

        let mut copy = req.copy();
        let msg = copy.message_mut();
        msg.command = verb;
        msg.set_trailing(args.to_string());

        self.inner.dispatch(Arc::new(copy)).await;
    }
}

impl Capability for CtcpMux {
    const ID: &'static str = "core.ctcp_mux";
}
