//! Logs chat traffic.

use chime::core::PRIVMSG;
use chime::prelude::*;
use tracing::{debug, info};

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("logger", init)
}

async fn init(ctx: PluginContext) -> Result<(), BoxError> {
    ctx.basic_mux()?.event("*", log_line);
    Ok(())
}

async fn log_line(message: Message) {
    match (message.sender(), message.target(), message.user_text()) {
        (Some(sender), Some(target), Some(text)) if message.command == PRIVMSG => {
            info!("[{target}] <{sender}> {text}");
        }
        _ => debug!(line = %message, "line"),
    }
}
