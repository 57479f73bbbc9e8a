//! `name++` / `name--` tracking and the `karma` command.

use std::sync::Arc;

use chime::core::PRIVMSG;
use chime::prelude::*;
use serde::Deserialize;
use tracing::debug;

use super::karma_store::KarmaStore;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
struct KarmaConfig {
    /// Changes counted from a single message.
    max_per_message: usize,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        Self { max_per_message: 3 }
    }
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new("karma", init).requires::<dyn KarmaStore>()
}

async fn init(ctx: PluginContext) -> Result<(), BoxError> {
    let config: KarmaConfig = ctx.config()?;
    let store = ctx.require::<dyn KarmaStore>()?;

    let tracker = store.clone();
    ctx.basic_mux()?.event(PRIVMSG, move |req: Arc<Request>| {
        let store = tracker.clone();
        async move { track(&store, &req, config.max_per_message).await }
    });

    ctx.command_mux()?.channel(
        "karma",
        move |Args(args): Args| {
            let store = store.clone();
            async move { report(&store, args.first().map(String::as_str)).await }
        },
        Some(HelpInfo::new(
            "[name]",
            "Show the karma of a name, or the top scores",
        )),
    );
    Ok(())
}

async fn track(store: &Arc<dyn KarmaStore>, req: &Request, max: usize) -> Option<String> {
    if !req.from_channel() || req.message().is_ctcp() {
        return None;
    }
    let sender = req.sender()?;
    let text = req.message().user_text()?;

    let mut replies = Vec::new();
    for (name, delta) in parse_changes(text, max) {
        if name.eq_ignore_ascii_case(sender) {
            debug!(sender = %sender, "Ignoring self karma");
            continue;
        }
        let score = store.adjust(&name, delta).await;
        replies.push(format!("{name}: {score}"));
    }
    (!replies.is_empty()).then(|| format!("karma {}", replies.join(", ")))
}

async fn report(store: &Arc<dyn KarmaStore>, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name} has {} karma", store.score(name).await),
        None => {
            let top = store.top(5).await;
            if top.is_empty() {
                return "Nobody has any karma yet".to_string();
            }
            let top: Vec<_> = top
                .iter()
                .map(|(name, score)| format!("{name} ({score})"))
                .collect();
            format!("Top karma: {}", top.join(", "))
        }
    }
}

/// Extracts up to `max` `name++` / `name--` changes from a line.
fn parse_changes(text: &str, max: usize) -> Vec<(String, i64)> {
    text.split_whitespace()
        .filter_map(|word| {
            let (name, delta) = match (word.strip_suffix("++"), word.strip_suffix("--")) {
                (Some(name), _) => (name, 1),
                (_, Some(name)) => (name, -1),
                _ => return None,
            };
            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_alphanumeric() || "_-[]\\`^{}|".contains(c));
            valid.then(|| (name.to_lowercase(), delta))
        })
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_changes() {
        assert_eq!(
            parse_changes("Rust++ and go-- but not ++ or c+", 5),
            vec![("rust".to_string(), 1), ("go".to_string(), -1)]
        );
        assert_eq!(parse_changes("a++ b++ c++ d++", 2).len(), 2);
        assert!(parse_changes("hello there", 3).is_empty());
    }
}
