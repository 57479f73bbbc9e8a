//! Protocol message model.
//!
//! A [`Message`] is one parsed protocol line:
//!
//! ```text
//! @time=2024-01-01T00:00:00Z :nick!user@host PRIVMSG #chan :hello world
//! └──────── tags ──────────┘ └─── prefix ──┘ └verb─┘ └────params─────┘
//! ```
//!
//! The last entry of [`Message::params`] doubles as the trailing free-text
//! parameter. Formatting re-adds the `:` marker whenever the last parameter
//! needs it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Verb carrying ordinary user text.
pub const PRIVMSG: &str = "PRIVMSG";

/// Verb carrying automated replies.
pub const NOTICE: &str = "NOTICE";

/// CTCP framing delimiter.
pub const CTCP_DELIM: char = '\x01';

// =============================================================================
// Prefix
// =============================================================================

/// Sender identity of a message (`name!user@host`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    /// Nick or server name.
    pub name: String,
    /// Username, if present.
    pub user: Option<String>,
    /// Hostname, if present.
    pub host: Option<String>,
}

impl Prefix {
    /// Creates a prefix with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            host: None,
        }
    }

    /// Parses a raw prefix without its leading `:`.
    pub fn parse(raw: &str) -> Self {
        let (rest, host) = match raw.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_string())),
            None => (raw, None),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, Some(user.to_string())),
            None => (rest, None),
        };
        Self {
            name: name.to_string(),
            user,
            host,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Message
// =============================================================================

/// A single parsed protocol line.
///
/// `Message` is a plain value: cloning it yields a fully independent copy, so
/// a mux layer that rewrites the verb or trailing text of its copy never
/// affects sibling layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// IRCv3 message tags, unescaped.
    pub tags: BTreeMap<String, String>,
    /// Sender identity.
    pub prefix: Option<Prefix>,
    /// Command verb, upper-cased for alphabetic verbs.
    pub command: String,
    /// Ordered parameters; the last one is the trailing parameter.
    pub params: Vec<String>,
}

impl Message {
    /// Creates a message without tags or prefix.
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: BTreeMap::new(),
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a `PRIVMSG` to `target`.
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(PRIVMSG, [target.into(), text.into()])
    }

    /// Builds a `NOTICE` to `target`.
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NOTICE, [target.into(), text.into()])
    }

    /// Attaches a prefix (builder style).
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Returns the sender's nick, if the message has a prefix.
    pub fn sender(&self) -> Option<&str> {
        self.prefix.as_ref().map(|p| p.name.as_str())
    }

    /// Returns the first parameter (the target for `PRIVMSG` / `NOTICE`).
    pub fn target(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    /// Returns the last parameter.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Replaces the last parameter, or appends one if there are none.
    pub fn set_trailing(&mut self, text: impl Into<String>) {
        match self.params.last_mut() {
            Some(last) => *last = text.into(),
            None => self.params.push(text.into()),
        }
    }

    /// Returns the free text of a `PRIVMSG` that has both a target and text.
    pub fn user_text(&self) -> Option<&str> {
        if self.command == PRIVMSG && self.params.len() >= 2 {
            self.trailing()
        } else {
            None
        }
    }

    /// Returns `(verb, args)` if this is a `PRIVMSG` carrying a CTCP request.
    pub fn ctcp(&self) -> Option<(String, &str)> {
        self.user_text().and_then(parse_ctcp)
    }

    /// Returns `true` if this is a `PRIVMSG` carrying a CTCP request.
    pub fn is_ctcp(&self) -> bool {
        self.ctcp().is_some()
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut rest = line;

        let mut tags = BTreeMap::new();
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, tail) = stripped
                .split_once(' ')
                .ok_or(ParseError::MissingCommand)?;
            for tag in raw_tags.split(';').filter(|t| !t.is_empty()) {
                let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
                if key.is_empty() {
                    return Err(ParseError::InvalidTag(tag.to_string()));
                }
                tags.insert(key.to_string(), unescape_tag_value(value));
            }
            rest = tail.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw_prefix, tail) = stripped
                .split_once(' ')
                .ok_or(ParseError::MissingCommand)?;
            if raw_prefix.is_empty() {
                return Err(ParseError::EmptyPrefix);
            }
            prefix = Some(Prefix::parse(raw_prefix));
            rest = tail.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param.to_string());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            f.write_str("@")?;
            for (i, (key, value)) in self.tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                f.write_str(key)?;
                if !value.is_empty() {
                    write!(f, "={}", escape_tag_value(value))?;
                }
            }
            f.write_str(" ")?;
        }

        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }

        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }

        Ok(())
    }
}

// =============================================================================
// CTCP helpers
// =============================================================================

/// Splits a CTCP-framed text into its upper-cased verb and argument string.
///
/// The closing delimiter is optional since some clients omit it.
pub fn parse_ctcp(text: &str) -> Option<(String, &str)> {
    let inner = text.strip_prefix(CTCP_DELIM)?;
    let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
    let (verb, args) = inner.split_once(' ').unwrap_or((inner, ""));
    if verb.is_empty() {
        return None;
    }
    Some((verb.to_ascii_uppercase(), args))
}

/// Wraps `verb` and `args` in CTCP delimiters.
pub fn ctcp_frame(verb: &str, args: &str) -> String {
    if args.is_empty() {
        format!("{CTCP_DELIM}{verb}{CTCP_DELIM}")
    } else {
        format!("{CTCP_DELIM}{verb} {args}{CTCP_DELIM}")
    }
}

// =============================================================================
// Tag escaping
// =============================================================================

fn unescape_tag_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            // A lone trailing backslash is dropped.
            None => {}
        }
    }
    out
}

fn escape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            ';' => out.push_str("\\:"),
            ' ' => out.push_str("\\s"),
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let msg: Message = "@id=42;time=now :nick!user@host PRIVMSG #chan :hello world"
            .parse()
            .unwrap();
        assert_eq!(msg.tags.get("id").map(String::as_str), Some("42"));
        assert_eq!(msg.tags.get("time").map(String::as_str), Some("now"));
        let prefix = msg.prefix.as_ref().unwrap();
        assert_eq!(prefix.name, "nick");
        assert_eq!(prefix.user.as_deref(), Some("user"));
        assert_eq!(prefix.host.as_deref(), Some("host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#chan", "hello world"]);
        assert_eq!(msg.user_text(), Some("hello world"));
    }

    #[test]
    fn test_parse_without_trailing_marker() {
        let msg: Message = "ping server.example".parse().unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.trailing(), Some("server.example"));
        assert!(msg.prefix.is_none());
    }

    #[test]
    fn test_parse_numeric_and_crlf() {
        let msg: Message = ":irc.example 001 chime :Welcome\r\n".parse().unwrap();
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params, vec!["chime", "Welcome"]);
        assert_eq!(msg.sender(), Some("irc.example"));
    }

    #[test]
    fn test_parse_empty_trailing() {
        let msg: Message = "PRIVMSG #chan :".parse().unwrap();
        assert_eq!(msg.params, vec!["#chan", ""]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Message>(), Err(ParseError::Empty));
        assert_eq!("   \r\n".parse::<Message>(), Err(ParseError::Empty));
        assert_eq!(":nick".parse::<Message>(), Err(ParseError::MissingCommand));
        assert_eq!(": PRIVMSG x".parse::<Message>(), Err(ParseError::EmptyPrefix));
        assert_eq!(
            "@=x PRIVMSG #c :x".parse::<Message>(),
            Err(ParseError::InvalidTag("=x".into()))
        );
    }

    #[test]
    fn test_tag_escaping() {
        let msg: Message = r"@note=a\sb\:c\\d PING x".parse().unwrap();
        assert_eq!(msg.tags["note"], r"a b;c\d");
        assert_eq!(msg.to_string(), r"@note=a\sb\:c\\d PING x");
    }

    #[test]
    fn test_format_adds_trailing_marker() {
        assert_eq!(
            Message::privmsg("#chan", "hello world").to_string(),
            "PRIVMSG #chan :hello world"
        );
        assert_eq!(Message::privmsg("#chan", "hi").to_string(), "PRIVMSG #chan hi");
        assert_eq!(Message::privmsg("#chan", "").to_string(), "PRIVMSG #chan :");
        assert_eq!(Message::new("PING", [":x"]).to_string(), "PING ::x");
        let msg = Message::new("QUIT", Vec::<String>::new()).with_prefix(Prefix::parse("a!b@c"));
        assert_eq!(msg.to_string(), ":a!b@c QUIT");
    }

    #[test]
    fn test_copy_is_independent() {
        let original = Message::privmsg("#chan", "!hello world");
        let mut copy = original.clone();
        copy.set_trailing("world");
        copy.command = "hello".into();
        assert_eq!(original.trailing(), Some("!hello world"));
        assert_eq!(original.command, PRIVMSG);
        assert_eq!(copy.trailing(), Some("world"));
    }

    #[test]
    fn test_user_text_requires_target_and_text() {
        assert_eq!(Message::new(PRIVMSG, ["#chan"]).user_text(), None);
        assert_eq!(Message::notice("#chan", "hi").user_text(), None);
    }

    #[test]
    fn test_ctcp() {
        let msg = Message::privmsg("chime", "\x01version\x01");
        assert_eq!(msg.ctcp(), Some(("VERSION".to_string(), "")));

        let msg = Message::privmsg("#chan", "\x01ACTION waves hello");
        assert_eq!(msg.ctcp(), Some(("ACTION".to_string(), "waves hello")));

        assert!(!Message::privmsg("#chan", "plain").is_ctcp());
        assert!(!Message::privmsg("#chan", "\x01\x01").is_ctcp());
        assert_eq!(ctcp_frame("PING", "123"), "\x01PING 123\x01");
        assert_eq!(ctcp_frame("VERSION", ""), "\x01VERSION\x01");
    }
}
