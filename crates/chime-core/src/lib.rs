//! # Chime Core
//!
//! Protocol-level building blocks shared by every other Chime crate:
//!
//! - [`Message`]: a parsed protocol line with tags, prefix, verb and params
//! - [`Capability`] / [`CapabilityKey`]: typed tokens plugins exchange
//! - [`Bot`]: the outbound write path
//! - [`Request`]: per-message context with reply helpers and timings

pub mod bot;
pub mod capability;
pub mod error;
pub mod message;
pub mod request;

pub use bot::{Bot, BotHandle};
pub use capability::{Capability, CapabilityKey};
pub use error::{BotError, BotResult, ParseError};
pub use message::{CTCP_DELIM, Message, NOTICE, PRIVMSG, Prefix, ctcp_frame, parse_ctcp};
pub use request::{Request, Timer};
