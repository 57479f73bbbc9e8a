//! The connection-backed [`Bot`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chime_core::{Bot, BotError, BotResult, Message};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

/// Bot handle for one live connection.
///
/// Writes are queued on an unbounded channel that the runtime's writer task
/// drains in order.
pub struct ClientBot {
    nick: RwLock<String>,
    outbound: mpsc::UnboundedSender<Message>,
}

impl ClientBot {
    /// Creates a handle and the receiving end of its outbound queue.
    pub fn new(nick: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bot = Arc::new(Self {
            nick: RwLock::new(nick.into()),
            outbound: tx,
        });
        (bot, rx)
    }

    /// Records the nick the server has confirmed for us.
    pub fn set_nick(&self, nick: impl Into<String>) {
        *self.nick.write() = nick.into();
    }
}

#[async_trait]
impl Bot for ClientBot {
    fn current_nick(&self) -> String {
        self.nick.read().clone()
    }

    async fn write(&self, message: Message) -> BotResult<()> {
        let line = message.to_string();
        if line.contains(['\r', '\n', '\0']) {
            return Err(BotError::LineBreak);
        }
        trace!(line = %line, "queueing outbound line");
        self.outbound
            .send(message)
            .map_err(|_| BotError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_queues_in_order() {
        let (bot, mut rx) = ClientBot::new("chime");
        bot.write(Message::privmsg("#rust", "one")).await.unwrap();
        bot.write_line("PRIVMSG #rust :two").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().to_string(), "PRIVMSG #rust one");
        assert_eq!(rx.recv().await.unwrap().to_string(), "PRIVMSG #rust two");
    }

    #[tokio::test]
    async fn test_rejects_line_breaks() {
        let (bot, mut rx) = ClientBot::new("chime");
        let err = bot
            .write(Message::privmsg("#rust", "hi\r\nQUIT :bye"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::LineBreak));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_is_not_connected() {
        let (bot, rx) = ClientBot::new("chime");
        drop(rx);
        let err = bot.write(Message::privmsg("#rust", "hi")).await.unwrap_err();
        assert!(matches!(err, BotError::NotConnected));
    }

    #[test]
    fn test_set_nick() {
        let (bot, _rx) = ClientBot::new("chime");
        bot.set_nick("chime_");
        assert_eq!(bot.current_nick(), "chime_");
    }
}
