//! Outbound bot API.
//!
//! The [`Bot`] trait is the single write path back to the protocol. The
//! runtime provides the concrete implementation; plugins and handlers only
//! ever see a [`BotHandle`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::Capability;
use crate::error::BotResult;
use crate::message::Message;

/// An active connection that messages can be written to.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns the nick the bot currently holds on the server.
    fn current_nick(&self) -> String;

    /// Queues a message for sending.
    async fn write(&self, message: Message) -> BotResult<()>;

    /// Parses a raw line and queues it for sending.
    async fn write_line(&self, line: &str) -> BotResult<()> {
        let message: Message = line.parse()?;
        self.write(message).await
    }
}

/// Shared handle to a [`Bot`].
pub type BotHandle = Arc<dyn Bot>;

impl Capability for dyn Bot {
    const ID: &'static str = "core.bot";
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Records every written message.
    pub struct RecordingBot {
        pub nick: String,
        pub sent: Mutex<Vec<Message>>,
    }

    impl RecordingBot {
        pub fn new(nick: &str) -> Arc<Self> {
            Arc::new(Self {
                nick: nick.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }

        pub fn lines(&self) -> Vec<String> {
            self.sent.lock().iter().map(ToString::to_string).collect()
        }
    }

    #[async_trait]
    impl Bot for RecordingBot {
        fn current_nick(&self) -> String {
            self.nick.clone()
        }

        async fn write(&self, message: Message) -> BotResult<()> {
            self.sent.lock().push(message);
            Ok(())
        }
    }
}
