//! Error types for the Chime framework.

use std::fmt;

use thiserror::Error;
use tower::BoxError;

// =============================================================================
// Handler errors
// =============================================================================

/// Errors that can occur while extracting handler parameters from a request.
///
/// An extraction failure skips the handler without logging at error level.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The message has no parameters.
    #[error("message has no trailing parameter")]
    MissingTrailing,

    /// The message has no prefix.
    #[error("message has no sender")]
    MissingSender,

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Returned by a handler service whose handler panicked.
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanicked {
    /// The panic payload rendered as text.
    pub message: String,
}

// =============================================================================
// Registry errors
// =============================================================================

/// Errors returned by [`PluginRegistry`](crate::plugin::PluginRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A plugin with this name is already registered.
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(String),
}

// =============================================================================
// Resolve errors
// =============================================================================

/// Who could provide a capability a stuck plugin still needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderHint {
    /// Another requested plugin provides it, but it is stuck too.
    Requested(String),
    /// Only registered plugins that were not requested provide it.
    Unrequested(Vec<String>),
    /// No registered plugin provides it.
    Nobody,
}

impl fmt::Display for ProviderHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested(name) => {
                write!(f, "provided by '{name}', which cannot be loaded either")
            }
            Self::Unrequested(names) => {
                let names = names
                    .iter()
                    .map(|n| format!("'{n}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "provided by {names}, not in the plugin list")
            }
            Self::Nobody => f.write_str("no registered plugin provides it"),
        }
    }
}

/// A single problem found while computing the load order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveIssue {
    /// A requested plugin is not registered.
    #[error("plugin '{0}' is not registered")]
    UnknownPlugin(String),

    /// A plugin appears more than once in the activation list.
    #[error("plugin '{0}' is requested more than once")]
    RequestedTwice(String),

    /// Two requested plugins provide the same capability.
    #[error("capability '{capability}' is provided by both '{first}' and '{second}'")]
    MultipleProviders {
        capability: &'static str,
        first: String,
        second: String,
    },

    /// A plugin requires a capability nothing loadable provides.
    #[error("plugin '{plugin}' requires '{capability}': {provider}")]
    Unsatisfied {
        plugin: String,
        capability: &'static str,
        provider: ProviderHint,
    },
}

/// The load order could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_issues(.issues))]
pub struct ResolveError {
    /// Every problem found, in discovery order.
    pub issues: Vec<ResolveIssue>,
}

fn render_issues(issues: &[ResolveIssue]) -> String {
    let mut out = format!("failed to resolve plugins ({} issue(s)):", issues.len());
    for issue in issues {
        out.push_str("\n  - ");
        out.push_str(&issue.to_string());
    }
    out
}

// =============================================================================
// Inject errors
// =============================================================================

/// Errors raised while constructing plugins.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The plugin is not in the registry.
    #[error("plugin '{0}' is not registered")]
    UnknownPlugin(String),

    /// The plugin was asked to load while it is already loading.
    #[error("plugin '{0}' is already loading (circular load)")]
    CircularLoad(String),

    /// The constructor returned an error.
    #[error("plugin '{plugin}' failed to load: {source}")]
    Constructor {
        plugin: String,
        #[source]
        source: BoxError,
    },

    /// The plugin required a capability it did not declare.
    #[error("plugin '{plugin}' requested undeclared capability '{capability}'")]
    UndeclaredRequire {
        plugin: String,
        capability: &'static str,
    },

    /// The plugin provided a capability it did not declare.
    #[error("plugin '{plugin}' provided undeclared capability '{capability}'")]
    UndeclaredProvide {
        plugin: String,
        capability: &'static str,
    },

    /// The plugin provided the same capability twice.
    #[error("capability '{capability}' was already provided (by '{plugin}')")]
    AlreadyProvided {
        plugin: String,
        capability: &'static str,
    },

    /// The constructor succeeded without providing a declared capability.
    #[error("plugin '{plugin}' did not provide declared capability '{capability}'")]
    MissingOutput {
        plugin: String,
        capability: &'static str,
    },

    /// A declared requirement has no value in the store.
    #[error("plugin '{plugin}' requires '{capability}', which has not been provided")]
    MissingValue {
        plugin: String,
        capability: &'static str,
    },
}
