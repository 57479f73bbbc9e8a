//! Event multiplexers.
//!
//! Every inbound line goes to the [`BasicMux`]. A `PRIVMSG` forwarder on it
//! hands user text to the higher-level muxes:
//!
//! ```text
//!                  ┌─ "*" handlers
//! line ─▶ BasicMux ┼─ VERB handlers
//!                  └─ PRIVMSG ─▶ CtcpMux           (\x01-framed)
//!                             └▶ CommandMux ─▶ MentionMux (otherwise)
//! ```

pub mod basic;
pub mod command;
pub mod ctcp;
pub mod mention;

use std::sync::Arc;

use chime_core::{PRIVMSG, Request};

use crate::plugin::ValueStore;

pub use basic::{BasicMux, WILDCARD};
pub use command::{CommandMux, DEFAULT_PREFIX, HelpInfo};
pub use ctcp::CtcpMux;
pub use mention::{MentionMux, strip_mention};

/// The full set of muxes for one connection.
#[derive(Clone)]
pub struct Muxes {
    pub basic: Arc<BasicMux>,
    pub command: Arc<CommandMux>,
    pub mention: Arc<MentionMux>,
    pub ctcp: Arc<CtcpMux>,
}

impl Muxes {
    /// Creates empty muxes with the given command prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            basic: Arc::new(BasicMux::new()),
            command: Arc::new(CommandMux::new(prefix)),
            mention: Arc::new(MentionMux::new()),
            ctcp: Arc::new(CtcpMux::new()),
        }
    }

    /// Registers the `PRIVMSG` forwarder on the basic mux.
    ///
    /// Call this before plugins register their own handlers so that
    /// commands run ahead of plugin-level `PRIVMSG` handlers.
    pub fn install_forwarders(&self) {
        let command = self.command.clone();
        let mention = self.mention.clone();
        let ctcp = self.ctcp.clone();
        self.basic.event(PRIVMSG, move |req: Arc<Request>| {
            let command = command.clone();
            let mention = mention.clone();
            let ctcp = ctcp.clone();
            async move {
                if req.message().is_ctcp() {
                    ctcp.dispatch(req).await;
                } else {
                    command.dispatch(req.clone()).await;
                    mention.dispatch(req).await;
                }
            }
        });
    }

    /// Seeds a core store with every mux.
    pub fn seed(&self, store: &ValueStore) {
        store.insert(self.basic.clone());
        store.insert(self.command.clone());
        store.insert(self.mention.clone());
        store.insert(self.ctcp.clone());
    }
}

impl Default for Muxes {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Trailing;
    use crate::testing::{TestBot, privmsg_from};

    #[tokio::test]
    async fn test_forwarder_routes_privmsg() {
        let bot = TestBot::new("chime");
        let muxes = Muxes::default();
        muxes.install_forwarders();

        muxes.command.event("echo", |Trailing(t): Trailing| async move { t }, None);
        muxes
            .mention
            .event(|Trailing(t): Trailing| async move { format!("you said {t}") });
        muxes.ctcp.event("PING", |req: Arc<Request>, Trailing(t): Trailing| async move {
            req.ctcp_reply("PING", &t).await
        });

        muxes
            .basic
            .dispatch(privmsg_from(&bot, "alice", "#chan", "!echo hi"))
            .await;
        muxes
            .basic
            .dispatch(privmsg_from(&bot, "alice", "#chan", "chime: hello"))
            .await;
        muxes
            .basic
            .dispatch(privmsg_from(&bot, "alice", "chime", "\x01PING 42\x01"))
            .await;

        assert_eq!(
            bot.lines(),
            vec![
                "PRIVMSG #chan hi",
                "PRIVMSG #chan :you said hello",
                "NOTICE alice :\x01PING 42\x01",
            ]
        );
    }

    #[tokio::test]
    async fn test_muxes_record_timings() {
        let bot = TestBot::new("chime");
        let muxes = Muxes::default();
        muxes.install_forwarders();

        let req = privmsg_from(&bot, "alice", "#chan", "!echo hi");
        muxes.basic.dispatch(req.clone()).await;
        let stages: Vec<String> = req.timings().into_iter().map(|(name, _)| name).collect();
        assert!(stages.contains(&"command_mux".to_string()));
        assert!(stages.contains(&"mention_mux".to_string()));
        assert!(!stages.contains(&"ctcp_mux".to_string()));

        let req = privmsg_from(&bot, "alice", "chime", "\x01VERSION\x01");
        muxes.basic.dispatch(req.clone()).await;
        let stages: Vec<String> = req.timings().into_iter().map(|(name, _)| name).collect();
        assert!(stages.contains(&"ctcp_mux".to_string()));
        assert!(!stages.contains(&"command_mux".to_string()));
    }

    #[test]
    fn test_seed() {
        let store = ValueStore::new();
        let muxes = Muxes::default();
        muxes.seed(&store);
        assert!(store.get::<CommandMux>().is_some());
        assert!(store.get::<BasicMux>().is_some());
        assert_eq!(store.len(), 4);
    }
}
