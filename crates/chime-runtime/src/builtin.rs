//! Connection upkeep handlers every bot needs.

use std::sync::Arc;

use chime_core::{Bot, Message};
use chime_framework::BasicMux;
use tracing::{info, warn};

use crate::client::ClientBot;

const NICKNAME_IN_USE: &str = "433";
const WELCOME: &str = "001";

/// Registers the built-in handlers on `basic`.
///
/// - `PING` is answered with a `PONG` carrying the same parameters
/// - `001` records the nick the server confirmed
/// - `NICK` from our own prefix tracks the rename
/// - `433` retries registration with `_` appended
pub fn install(basic: &BasicMux, client: &Arc<ClientBot>) {
    basic.event("PING", pong);

    let bot = client.clone();
    basic.event(WELCOME, move |message: Message| {
        let bot = bot.clone();
        async move {
            if let Some(nick) = message.params.first() {
                info!(nick = %nick, "registered with server");
                bot.set_nick(nick.clone());
            }
        }
    });

    let bot = client.clone();
    basic.event("NICK", move |message: Message| {
        let bot = bot.clone();
        async move {
            let current = bot.current_nick();
            let ours = message
                .sender()
                .is_some_and(|sender| sender.eq_ignore_ascii_case(&current));
            if ours && let Some(new_nick) = message.params.first() {
                info!(nick = %new_nick, "nick changed");
                bot.set_nick(new_nick.clone());
            }
        }
    });

    let bot = client.clone();
    basic.event(NICKNAME_IN_USE, move |message: Message| {
        let bot = bot.clone();
        async move {
            let taken = message
                .params
                .get(1)
                .cloned()
                .unwrap_or_else(|| bot.current_nick());
            let retry = format!("{taken}_");
            warn!(taken = %taken, retry = %retry, "nick in use");
            bot.set_nick(retry.clone());
            Message::new("NICK", [retry])
        }
    });
}

async fn pong(message: Message) -> Message {
    Message::new("PONG", message.params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::Request;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn setup() -> (BasicMux, Arc<ClientBot>, UnboundedReceiver<Message>) {
        let (bot, rx) = ClientBot::new("chime");
        let basic = BasicMux::new();
        install(&basic, &bot);
        (basic, bot, rx)
    }

    async fn feed(basic: &BasicMux, bot: &Arc<ClientBot>, line: &str) {
        let message: Message = line.parse().unwrap();
        basic
            .dispatch(Arc::new(Request::new(message, bot.clone())))
            .await;
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (basic, bot, mut rx) = setup();
        feed(&basic, &bot, "PING :irc.example.net").await;
        assert_eq!(rx.try_recv().unwrap().to_string(), "PONG irc.example.net");
    }

    #[tokio::test]
    async fn test_welcome_and_rename_track_nick() {
        let (basic, bot, _rx) = setup();
        feed(&basic, &bot, ":irc.example 001 chime_ :Welcome").await;
        assert_eq!(bot.current_nick(), "chime_");

        feed(&basic, &bot, ":someone!u@h NICK other").await;
        assert_eq!(bot.current_nick(), "chime_");

        feed(&basic, &bot, ":chime_!u@h NICK :chime").await;
        assert_eq!(bot.current_nick(), "chime");
    }

    #[tokio::test]
    async fn test_rename_matches_own_nick_case_insensitively() {
        let (basic, bot, _rx) = setup();
        feed(&basic, &bot, ":Chime!u@h NICK :chime2").await;
        assert_eq!(bot.current_nick(), "chime2");
    }

    #[tokio::test]
    async fn test_nick_in_use_retries() {
        let (basic, bot, mut rx) = setup();
        feed(
            &basic,
            &bot,
            ":irc.example 433 * chime :Nickname is already in use",
        )
        .await;
        assert_eq!(rx.try_recv().unwrap().to_string(), "NICK chime_");
        assert_eq!(bot.current_nick(), "chime_");
    }
}
