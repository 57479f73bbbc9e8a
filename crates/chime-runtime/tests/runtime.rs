//! End-to-end runs over in-memory streams.

use std::sync::Arc;

use chime_core::Capability;
use chime_framework::{BoxError, HelpInfo, PluginContext, PluginDescriptor, Sender};
use chime_runtime::{ChimeConfig, ChimeRuntime, RuntimeError};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

trait Greeting: Send + Sync {
    fn text(&self) -> String;
}

impl Capability for dyn Greeting {
    const ID: &'static str = "test.greeting";
}

struct FixedGreeting(String);

impl Greeting for FixedGreeting {
    fn text(&self) -> String {
        self.0.clone()
    }
}

#[derive(Deserialize)]
struct GreetingConfig {
    #[serde(default = "default_greeting")]
    text: String,
}

fn default_greeting() -> String {
    "Hello".to_string()
}

async fn greeting_store(ctx: PluginContext) -> Result<(), BoxError> {
    let config: GreetingConfig = ctx.config()?;
    ctx.provide::<dyn Greeting>(Arc::new(FixedGreeting(config.text)))?;
    Ok(())
}

async fn greeter(ctx: PluginContext) -> Result<(), BoxError> {
    let greeting = ctx.require::<dyn Greeting>()?;
    ctx.command_mux()?.event(
        "hello",
        move |Sender(nick): Sender| {
            let greeting = greeting.clone();
            async move { format!("{} {nick}", greeting.text()) }
        },
        Some(HelpInfo::description("Say hello")),
    );
    ctx.ctcp_mux()?
        .event("version", |req: Arc<chime_core::Request>| async move {
            req.ctcp_reply("VERSION", "chime-test").await
        });
    Ok(())
}

fn runtime(config: ChimeConfig) -> ChimeRuntime {
    let mut runtime = ChimeRuntime::from_config(&config);
    // Registered consumer first: the resolver has to reorder them.
    runtime
        .register_plugin(PluginDescriptor::new("greeter", greeter).requires::<dyn Greeting>())
        .unwrap();
    runtime
        .register_plugin(
            PluginDescriptor::new("greeting-store", greeting_store).provides::<dyn Greeting>(),
        )
        .unwrap();
    runtime
}

/// Feeds `input` to the runtime, waits for it to stop and returns what it
/// wrote.
async fn drive(runtime: ChimeRuntime, input: &str) -> (Result<(), RuntimeError>, Vec<String>) {
    drive_bytes(runtime, input.as_bytes()).await
}

async fn drive_bytes(
    runtime: ChimeRuntime,
    input: &[u8],
) -> (Result<(), RuntimeError>, Vec<String>) {
    let (client_in, mut server_out) = duplex(64 * 1024);
    let (client_out, mut server_in) = duplex(64 * 1024);

    server_out.write_all(input).await.unwrap();
    drop(server_out);

    let result = runtime
        .run_until(client_in, client_out, std::future::pending())
        .await;

    let mut written = String::new();
    server_in.read_to_string(&mut written).await.unwrap();
    let lines = written.split("\r\n").filter(|l| !l.is_empty()).map(String::from).collect();
    (result, lines)
}

#[tokio::test]
async fn test_end_to_end_dispatch() {
    let input = concat!(
        ":irc.example 001 chime :Welcome\r\n",
        "PING :irc.example\r\n",
        ":alice!a@host PRIVMSG #rust :!hello\r\n",
        ":alice!a@host PRIVMSG #rust :!help\r\n",
        ":\r\n",
        ":alice!a@host PRIVMSG chime :\x01VERSION\x01\r\n",
    );
    let (result, lines) = drive(runtime(ChimeConfig::default()), input).await;
    result.unwrap();

    assert_eq!(
        lines,
        vec![
            "NICK chime",
            "USER chime 0 * :Chime Bot",
            "PONG irc.example",
            "PRIVMSG #rust :Hello alice",
            "PRIVMSG #rust :Available commands: hello, help. Use !help [command] for more info.",
            "NOTICE alice :\x01VERSION chime-test\x01",
        ]
    );
}

#[tokio::test]
async fn test_plugin_config_and_password() {
    let mut config = ChimeConfig::default();
    config.bot.password = Some("hunter2".into());
    config.bot.command_prefix = ".".into();
    config
        .plugin
        .insert("greeting-store".into(), json!({ "text": "Howdy" }));

    let input = ":bob!b@host PRIVMSG #rust :.hello\r\n";
    let (result, lines) = drive(runtime(config), input).await;
    result.unwrap();

    assert_eq!(lines[0], "PASS hunter2");
    assert_eq!(lines.last().unwrap(), "PRIVMSG #rust :Howdy bob");
}

#[tokio::test]
async fn test_invalid_utf8_does_not_stop_the_runtime() {
    let input: &[u8] = b":alice!a@host PRIVMSG #rust :caf\xe9\r\nPING :after\r\n";
    let (result, lines) = drive_bytes(runtime(ChimeConfig::default()), input).await;
    result.unwrap();
    assert_eq!(lines.last().unwrap(), "PONG after");
}

#[tokio::test]
async fn test_unsatisfied_plugin_fails_before_connecting() {
    let config = ChimeConfig {
        plugins: vec!["greeter".into()],
        ..Default::default()
    };
    let (result, lines) = drive(runtime(config), "").await;

    let Err(RuntimeError::Resolve(err)) = result else {
        panic!("expected a resolution error");
    };
    assert_eq!(err.issues.len(), 1);
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = ChimeConfig::default();
    config.bot.nick = "two words".into();
    let (result, _) = drive(runtime(config), "").await;
    assert!(matches!(result, Err(RuntimeError::Config(_))));
}
