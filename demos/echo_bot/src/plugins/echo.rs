//! `echo` and `ping` commands.

use std::sync::Arc;

use chime::core::BotResult;
use chime::prelude::*;

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("echo", init)
}

async fn init(ctx: PluginContext) -> Result<(), BoxError> {
    let commands = ctx.command_mux()?;
    commands.event(
        "echo",
        echo,
        Some(HelpInfo::new("<text>", "Repeat the text back")),
    );
    commands.event(
        "ping",
        ping,
        Some(HelpInfo::description("Check that the bot is alive")),
    );
    Ok(())
}

async fn echo(Trailing(text): Trailing) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

async fn ping(req: Arc<Request>) -> BotResult<()> {
    req.mention_reply("pong").await
}
