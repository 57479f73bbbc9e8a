//! Shared test fixtures.

use std::sync::Arc;

use async_trait::async_trait;
use chime_core::{Bot, BotResult, Message, Prefix, Request};
use parking_lot::Mutex;

pub struct TestBot {
    nick: String,
    sent: Mutex<Vec<Message>>,
}

impl TestBot {
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
impl Bot for TestBot {
    fn current_nick(&self) -> String {
        self.nick.clone()
    }

    async fn write(&self, message: Message) -> BotResult<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

pub fn privmsg_from(bot: &Arc<TestBot>, sender: &str, target: &str, text: &str) -> Arc<Request> {
    let message =
        Message::privmsg(target, text).with_prefix(Prefix::parse(&format!("{sender}!u@host")));
    Arc::new(Request::new(message, bot.clone()))
}

pub fn request(bot: &Arc<TestBot>, line: &str) -> Arc<Request> {
    let message: Message = line.parse().unwrap();
    Arc::new(Request::new(message, bot.clone()))
}
