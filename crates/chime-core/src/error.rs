//! Unified error types for the Chime core.
//!
//! Framework-level errors (registry, resolution, injection) live in
//! `chime-framework`.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors produced when a raw protocol line cannot be parsed into a
/// [`Message`](crate::message::Message).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line was empty or contained only whitespace.
    #[error("empty line")]
    Empty,

    /// The line had tags or a prefix but no command verb.
    #[error("missing command verb")]
    MissingCommand,

    /// The line started with `:` but the prefix itself was empty.
    #[error("empty message prefix")]
    EmptyPrefix,

    /// A message tag had an empty key.
    #[error("invalid message tag: {0:?}")]
    InvalidTag(String),
}

// =============================================================================
// Bot Errors
// =============================================================================

/// Errors that can occur when writing to the protocol through a bot handle.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// The outbound channel is closed.
    #[error("bot is not connected")]
    NotConnected,

    /// A raw line could not be parsed before sending.
    #[error("invalid outbound line: {0}")]
    InvalidLine(#[from] ParseError),

    /// The formatted line would contain a line break or NUL byte.
    #[error("outbound line contains a line break or NUL byte")]
    LineBreak,

    /// The request carries no channel or sender to answer.
    #[error("request has no reply target")]
    NoReplyTarget,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for outbound bot operations.
pub type BotResult<T> = Result<T, BotError>;
