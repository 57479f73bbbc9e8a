//! Per-message request context.
//!
//! A [`Request`] is created once for every inbound line and handed down the
//! mux pipeline. Mux layers that rewrite the message work on a
//! [`copy`](Request::copy), which keeps the request id, timings and tracing
//! span but owns its own [`Message`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::Span;
use uuid::Uuid;

use crate::bot::BotHandle;
use crate::error::{BotError, BotResult};
use crate::message::{Message, ctcp_frame};

type TimingTable = Arc<Mutex<Vec<(String, Duration)>>>;

/// Context for a single inbound message.
pub struct Request {
    id: Uuid,
    message: Message,
    bot: BotHandle,
    timings: TimingTable,
    span: Span,
}

impl Request {
    /// Wraps a freshly received message.
    pub fn new(message: Message, bot: BotHandle) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("request", id = %id, command = %message.command);
        Self {
            id,
            message,
            bot,
            timings: Arc::default(),
            span,
        }
    }

    /// Returns a copy with an independent message and shared bookkeeping.
    pub fn copy(&self) -> Self {
        Self {
            id: self.id,
            message: self.message.clone(),
            bot: self.bot.clone(),
            timings: Arc::clone(&self.timings),
            span: self.span.clone(),
        }
    }

    /// Returns the request id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Returns the message mutably.
    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// Returns the bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    /// Returns the tracing span of this request.
    pub fn span(&self) -> &Span {
        &self.span
    }

    // =========================================================================
    // Context queries
    // =========================================================================

    /// Returns `true` if the message was sent to a channel rather than to the
    /// bot directly.
    pub fn from_channel(&self) -> bool {
        match self.message.target() {
            Some(target) => !target.eq_ignore_ascii_case(&self.bot.current_nick()),
            None => false,
        }
    }

    /// Returns the sender's nick.
    pub fn sender(&self) -> Option<&str> {
        self.message.sender()
    }

    /// Returns where a reply should go: the channel, or the sender for
    /// private messages.
    pub fn reply_target(&self) -> Option<&str> {
        if self.from_channel() {
            self.message.target()
        } else {
            self.sender()
        }
    }

    // =========================================================================
    // Timings
    // =========================================================================

    /// Starts a named timer that records into this request's timing table.
    pub fn timer(&self, name: impl Into<String>) -> Timer {
        Timer {
            name: Some(name.into()),
            start: Instant::now(),
            table: Arc::clone(&self.timings),
        }
    }

    /// Returns a snapshot of the recorded timings, in completion order.
    pub fn timings(&self) -> Vec<(String, Duration)> {
        self.timings.lock().clone()
    }

    // =========================================================================
    // Outbound effects
    // =========================================================================

    /// Replies in the channel, or privately if the message was private.
    pub async fn reply(&self, text: impl Into<String>) -> BotResult<()> {
        let target = self.reply_target().ok_or(BotError::NoReplyTarget)?;
        self.write(Message::privmsg(target, text)).await
    }

    /// Replies addressing the sender by nick in channels.
    pub async fn mention_reply(&self, text: impl Into<String>) -> BotResult<()> {
        let text = text.into();
        if self.from_channel() {
            let sender = self.sender().ok_or(BotError::NoReplyTarget)?;
            self.reply(format!("{sender}: {text}")).await
        } else {
            self.reply(text).await
        }
    }

    /// Replies to the sender directly, regardless of where the message came from.
    pub async fn private_reply(&self, text: impl Into<String>) -> BotResult<()> {
        let sender = self.sender().ok_or(BotError::NoReplyTarget)?;
        self.write(Message::privmsg(sender, text)).await
    }

    /// Answers a CTCP request with a framed `NOTICE` to the sender.
    pub async fn ctcp_reply(&self, verb: &str, text: &str) -> BotResult<()> {
        let sender = self.sender().ok_or(BotError::NoReplyTarget)?;
        self.write(Message::notice(sender, ctcp_frame(verb, text)))
            .await
    }

    /// Writes a message through the bot.
    pub async fn write(&self, message: Message) -> BotResult<()> {
        self.bot.write(message).await
    }

    /// Parses and writes a raw line through the bot.
    pub async fn write_line(&self, line: &str) -> BotResult<()> {
        self.bot.write_line(line).await
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Measures a named section of request handling.
///
/// The elapsed time is recorded on [`done`](Timer::done) or when the timer is
/// dropped, whichever comes first.
pub struct Timer {
    name: Option<String>,
    start: Instant,
    table: TimingTable,
}

impl Timer {
    /// Stops the timer and records the elapsed time.
    pub fn done(mut self) {
        self.record();
    }

    fn record(&mut self) {
        if let Some(name) = self.name.take() {
            self.table.lock().push((name, self.start.elapsed()));
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}
