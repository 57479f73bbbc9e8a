//! Greets people who mention the bot or join a channel.

use std::sync::Arc;

use chime::core::BotResult;
use chime::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct GreetConfig {
    greeting: String,
}

impl Default for GreetConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
        }
    }
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("greet", init)
}

async fn init(ctx: PluginContext) -> Result<(), BoxError> {
    let config: GreetConfig = ctx.config()?;
    let greeting: Arc<str> = config.greeting.into();

    let on_mention = greeting.clone();
    ctx.mention_mux()?.event(move |req: Arc<Request>| {
        let greeting = on_mention.clone();
        async move { req.mention_reply(format!("{greeting}!")).await }
    });

    ctx.basic_mux()?.event("JOIN", move |req: Arc<Request>| {
        let greeting = greeting.clone();
        async move { welcome(&req, &greeting).await }
    });
    Ok(())
}

async fn welcome(req: &Request, greeting: &str) -> BotResult<()> {
    let (Some(nick), Some(channel)) = (req.sender(), req.message().target()) else {
        return Ok(());
    };
    if nick.eq_ignore_ascii_case(&req.bot().current_nick()) {
        return Ok(());
    }
    req.write(Message::privmsg(channel, format!("{greeting}, {nick}!")))
        .await
}
