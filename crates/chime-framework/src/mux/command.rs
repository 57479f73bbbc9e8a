//! Prefixed command dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chime_core::{BotResult, Capability, Request};
use parking_lot::RwLock;
use tracing::debug;

use super::basic::BasicMux;
use crate::handler::{Handler, into_boxed_handler};

/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "!";

const HELP_VERB: &str = "help";

/// Usage and description shown by the built-in `help` command.
///
/// Empty fields are omitted from the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpInfo {
    pub usage: String,
    pub description: String,
}

impl HelpInfo {
    pub fn new(usage: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            description: description.into(),
        }
    }

    /// Help with only a description.
    pub fn description(description: impl Into<String>) -> Self {
        Self::new("", description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Channel,
    Private,
}

type HelpTable = RwLock<BTreeMap<String, Option<HelpInfo>>>;

#[derive(Default)]
struct HelpTables {
    channel: HelpTable,
    private: HelpTable,
}

impl HelpTables {
    fn table(&self, scope: Scope) -> &HelpTable {
        match scope {
            Scope::Channel => &self.channel,
            Scope::Private => &self.private,
        }
    }
}

/// Dispatches `PRIVMSG`s of the form `!verb args` to per-verb handlers.
///
/// Channel messages must start with the prefix. Private messages to the bot
/// are treated as commands whether or not they carry it. Inside a handler,
/// the message's command is the lower-cased verb and its trailing parameter
/// holds the trimmed arguments.
pub struct CommandMux {
    prefix: Arc<str>,
    channel: BasicMux,
    private: BasicMux,
    help: Arc<HelpTables>,
}

impl CommandMux {
    /// Creates a command mux with the built-in `help` command registered.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mux = Self {
            prefix: Arc::from(prefix.into()),
            channel: BasicMux::new(),
            private: BasicMux::new(),
            help: Arc::default(),
        };
        let info = Some(HelpInfo::new("<command>", "Gives you help with a command"));
        for scope in [Scope::Channel, Scope::Private] {
            let tables = mux.help.clone();
            let prefix = mux.prefix.clone();
            let handler = move |req: Arc<Request>| {
                send_help(tables.clone(), prefix.clone(), scope, req)
            };
            mux.register(scope, HELP_VERB, handler, info.clone());
        }
        mux
    }

    /// Returns the command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers a command in both channel and private scope.
    pub fn event<H, T>(&self, verb: &str, handler: H, help: Option<HelpInfo>)
    where
        H: Handler<T>,
        T: 'static,
    {
        let verb = verb.to_lowercase();
        let boxed = into_boxed_handler(handler);
        self.channel.event_boxed(verb.clone(), boxed.clone());
        self.private.event_boxed(verb.clone(), boxed);
        self.help.channel.write().insert(verb.clone(), help.clone());
        self.help.private.write().insert(verb, help);
    }

    /// Registers a command that only runs in channels.
    pub fn channel<H, T>(&self, verb: &str, handler: H, help: Option<HelpInfo>)
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register(Scope::Channel, verb, handler, help);
    }

    /// Registers a command that only runs in private messages.
    pub fn private<H, T>(&self, verb: &str, handler: H, help: Option<HelpInfo>)
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register(Scope::Private, verb, handler, help);
    }

    fn register<H, T>(&self, scope: Scope, verb: &str, handler: H, help: Option<HelpInfo>)
    where
        H: Handler<T>,
        T: 'static,
    {
        let verb = verb.to_lowercase();
        match scope {
            Scope::Channel => self.channel.event(verb.clone(), handler),
            Scope::Private => self.private.event(verb.clone(), handler),
        }
        self.help.table(scope).write().insert(verb, help);
    }

    /// Returns the sorted verbs available in channels.
    pub fn channel_commands(&self) -> Vec<String> {
        self.help.channel.read().keys().cloned().collect()
    }

    /// Returns the sorted verbs available in private messages.
    pub fn private_commands(&self) -> Vec<String> {
        self.help.private.read().keys().cloned().collect()
    }

    /// Dispatches the request if it is a command.
    pub async fn dispatch(&self, req: Arc<Request>) {
        let _timer = req.timer("command_mux");

        let Some(text) = req.message().user_text() else {
            return;
        };

        let scope = if req.from_channel() {
            Scope::Channel
        } else {
            Scope::Private
        };
        let (word, rest) = text.split_once(' ').unwrap_or((text, ""));
        let word = match (word.strip_prefix(&*self.prefix), scope) {
            (Some(stripped), _) => stripped,
            (None, Scope::Private) => word,
            (None, Scope::Channel) => return,
        };
        let verb = word.to_lowercase();
        if verb.is_empty() {
            return;
        }

        debug!(request_id = %req.id(), verb = %verb, ?scope, "command");

        let mut copy = req.copy();
        let rest = rest.trim().to_string();
        let msg = copy.message_mut();
        msg.command = verb;
        msg.set_trailing(rest);
        let copy = Arc::new(copy);

        match scope {
            Scope::Channel => self.channel.dispatch(copy).await,
            Scope::Private => self.private.dispatch(copy).await,
        }
    }
}

impl Default for CommandMux {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Capability for CommandMux {
    const ID: &'static str = "core.command_mux";
}

async fn send_help(
    tables: Arc<HelpTables>,
    prefix: Arc<str>,
    scope: Scope,
    req: Arc<Request>,
) -> BotResult<()> {
    let arg = req
        .message()
        .trailing()
        .and_then(|t| t.split_whitespace().next())
        .map(|w| w.strip_prefix(&*prefix).unwrap_or(w).to_lowercase())
        .unwrap_or_default();

    // Snapshot so the lock is not held across the replies.
    let table = tables.table(scope).read().clone();

    if arg.is_empty() {
        return match scope {
            Scope::Channel => {
                let verbs: Vec<&str> = table.keys().map(String::as_str).collect();
                req.reply(format!(
                    "Available commands: {}. Use {prefix}help [command] for more info.",
                    verbs.join(", ")
                ))
                .await
            }
            Scope::Private => {
                for (verb, info) in &table {
                    req.reply(listing_line(&prefix, verb, info.as_ref())).await?;
                }
                Ok(())
            }
        };
    }

    match table.get(&arg) {
        Some(Some(info)) if !info.usage.is_empty() || !info.description.is_empty() => {
            if !info.usage.is_empty() {
                req.reply(format!("Usage: {prefix}{arg} {}", info.usage))
                    .await?;
            }
            if !info.description.is_empty() {
                req.reply(info.description.clone()).await?;
            }
            Ok(())
        }
        _ => {
            req.mention_reply(format!(
                "There is no help available for command \"{arg}\"."
            ))
            .await
        }
    }
}

fn listing_line(prefix: &str, verb: &str, info: Option<&HelpInfo>) -> String {
    let Some(info) = info else {
        return format!("{prefix}{verb}");
    };
    let mut line = format!("{prefix}{verb}");
    if !info.usage.is_empty() {
        line.push(' ');
        line.push_str(&info.usage);
    }
    if !info.description.is_empty() {
        line.push_str(": ");
        line.push_str(&info.description);
    }
    line
}
