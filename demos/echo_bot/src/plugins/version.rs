//! Answers CTCP `VERSION` and `PING`.

use std::sync::Arc;

use chime::core::BotResult;
use chime::prelude::*;

const VERSION: &str = concat!("chime echo-bot ", env!("CARGO_PKG_VERSION"));

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("version", init)
}

async fn init(ctx: PluginContext) -> Result<(), BoxError> {
    let ctcp = ctx.ctcp_mux()?;
    ctcp.event("VERSION", version);
    ctcp.event("PING", ping);
    Ok(())
}

async fn version(req: Arc<Request>) -> BotResult<()> {
    req.ctcp_reply("VERSION", VERSION).await
}

async fn ping(req: Arc<Request>, Trailing(token): Trailing) -> BotResult<()> {
    req.ctcp_reply("PING", &token).await
}
