//! Startup orchestration and the connection loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chime_runtime::ChimeRuntime;
//!
//! let mut runtime = ChimeRuntime::builder()
//!     .config_file("chime.toml")
//!     .build()?;
//! runtime.register_plugin(echo::descriptor())?;
//! runtime.run().await?;
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chime_core::{BotHandle, Message, Request};
use chime_framework::{
    BasicMux, Injector, Muxes, PluginDescriptor, PluginRegistry, ValueStore, resolve,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::signal;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, trace, warn};

use crate::builtin;
use crate::client::ClientBot;
use crate::config::{ChimeConfig, ConfigLoader, ConfigResult, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A bot process: configuration plus the plugins it may activate.
pub struct ChimeRuntime {
    config: ChimeConfig,
    registry: PluginRegistry,
}

impl ChimeRuntime {
    /// Creates a runtime from `chime.toml` in the current directory, falling
    /// back to defaults if it cannot be loaded.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: failed to load config ({e}), using defaults");
                ChimeConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration and
    /// initializes logging from its `[logging]` section.
    pub fn from_config(config: &ChimeConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            registry: PluginRegistry::new(),
        }
    }

    pub fn config(&self) -> &ChimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Makes a plugin available for activation.
    pub fn register_plugin(&mut self, descriptor: PluginDescriptor) -> RuntimeResult<()> {
        debug!(plugin = %descriptor.name(), "Registered plugin");
        self.registry.register(descriptor)?;
        Ok(())
    }

    /// Connects to `connection.addr` and runs until the server closes the
    /// connection or a shutdown signal arrives.
    pub async fn run(self) -> RuntimeResult<()> {
        info!(addr = %self.config.connection.addr, "Connecting");
        let stream = TcpStream::connect(&self.config.connection.addr).await?;
        let (reader, writer) = stream.into_split();
        self.run_with(reader, writer).await
    }

    /// Runs over an arbitrary line stream until EOF or a shutdown signal.
    pub async fn run_with<R, W>(self, reader: R, writer: W) -> RuntimeResult<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.run_until(reader, writer, wait_for_shutdown()).await
    }

    /// Runs over an arbitrary line stream until EOF or `shutdown` completes.
    pub async fn run_until<R, W, F>(self, reader: R, writer: W, shutdown: F) -> RuntimeResult<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        validate_config(&self.config)?;
        let Self { config, registry } = self;

        let (client, outbound) = ClientBot::new(config.bot.nick.clone());
        let bot: BotHandle = client.clone();

        let muxes = Muxes::new(config.bot.command_prefix.clone());
        muxes.install_forwarders();
        builtin::install(&muxes.basic, &client);

        let core = Arc::new(ValueStore::new());
        core.insert(bot.clone());
        muxes.seed(&core);

        let registry = Arc::new(registry);
        let order = resolve(&registry, &config.plugins, &core).inspect_err(|err| {
            for issue in &err.issues {
                error!(issue = %issue, "Plugin resolution failed");
            }
        })?;
        debug!(order = ?order, "Resolved plugin load order");

        let injector = Injector::new(registry, core).with_configs(config.plugin.clone());
        injector
            .load_all(&order)
            .await
            .inspect_err(|err| error!(error = %err, "Plugin construction failed"))?;
        let plugins = injector.into_loaded();
        info!(plugins = ?plugins.names(), "Plugins loaded");

        let stop = CancellationToken::new();
        let writer_task = tokio::spawn(write_loop(writer, outbound, stop.clone()));

        let read_result = async {
            register(&bot, &config).await?;
            read_loop(reader, &muxes.basic, &bot, shutdown).await?;
            Ok::<(), RuntimeError>(())
        }
        .await;

        stop.cancel();
        let write_result = writer_task.await?;
        read_result?;
        write_result?;

        info!("Runtime stopped");
        Ok(())
    }
}

impl Default for ChimeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends the connection registration lines.
async fn register(bot: &BotHandle, config: &ChimeConfig) -> RuntimeResult<()> {
    if let Some(password) = &config.bot.password {
        bot.write(Message::new("PASS", [password.as_str()])).await?;
    }
    bot.write(Message::new("NICK", [config.bot.nick.as_str()]))
        .await?;
    bot.write(Message::new(
        "USER",
        [
            config.bot.user.as_str(),
            "0",
            "*",
            config.bot.name.as_str(),
        ],
    ))
    .await?;
    Ok(())
}

async fn read_loop<R, F>(
    reader: R,
    basic: &BasicMux,
    bot: &BotHandle,
    shutdown: F,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: Future<Output = ()>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(512);
    tokio::pin!(shutdown);

    loop {
        buf.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read?,
            _ = &mut shutdown => {
                info!("Shutdown requested");
                return Ok(());
            }
        };
        if read == 0 {
            info!("Connection closed");
            return Ok(());
        }
        let line = decode_line(&buf);
        dispatch_line(basic, bot, &line).await;
    }
}

/// Strips the line terminator and decodes the line, replacing invalid UTF-8.
fn decode_line(buf: &[u8]) -> Cow<'_, str> {
    let bytes = buf.strip_suffix(b"\n").unwrap_or(buf);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    let line = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = line {
        warn!(line = %line, "Replaced invalid UTF-8 in inbound line");
    }
    line
}

/// Parses one inbound line and runs it through the basic mux.
async fn dispatch_line(basic: &BasicMux, bot: &BotHandle, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    trace!(line = %line, "<<");

    let message: Message = match line.parse() {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, line = %line, "Skipping unparseable line");
            return;
        }
    };

    let req = Arc::new(Request::new(message, bot.clone()));
    let span = req.span().clone();
    basic.dispatch(req.clone()).instrument(span).await;

    for (stage, elapsed) in req.timings() {
        debug!(
            request_id = %req.id(),
            stage = %stage,
            elapsed_us = elapsed.as_micros() as u64,
            "Dispatch timing"
        );
    }
}

/// Drains the outbound queue. After `stop` fires, lines already queued are
/// still written before the writer shuts down.
async fn write_loop<W>(
    mut writer: W,
    mut outbound: UnboundedReceiver<Message>,
    stop: CancellationToken,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            message = outbound.recv() => match message {
                Some(message) => write_message(&mut writer, &message).await?,
                None => break,
            },
            _ = stop.cancelled() => {
                while let Ok(message) = outbound.try_recv() {
                    write_message(&mut writer, &message).await?;
                }
                break;
            }
        }
    }
    writer.shutdown().await
}

async fn write_message<W>(writer: &mut W, message: &Message) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = message.to_string();
    trace!(line = %line, ">>");
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

/// Waits for Ctrl+C, or SIGTERM on Unix.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to register SIGTERM handler");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`ChimeRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = ChimeRuntime::builder()
///     .config_file("config/chime.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables `CHIME_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges programmatic defaults below files and environment variables.
    pub fn merge(mut self, config: ChimeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> ConfigResult<ChimeRuntime> {
        let config = self.config_loader.load()?;
        Ok(ChimeRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"PING :a\r\n"), "PING :a");
        assert_eq!(decode_line(b"PING :a\n"), "PING :a");
        assert_eq!(decode_line(b"PING :a"), "PING :a");
        assert_eq!(decode_line(b"PRIVMSG #c :caf\xe9\r\n"), "PRIVMSG #c :caf\u{fffd}");
    }
}
