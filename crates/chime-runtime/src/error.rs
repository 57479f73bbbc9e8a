//! Runtime error types.

use chime_core::BotError;
use chime_framework::{InjectError, RegistryError, ResolveError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can stop the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plugin was registered twice.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The active plugin set has no valid load order.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A plugin failed to construct.
    #[error(transparent)]
    Inject(#[from] InjectError),

    /// A registration line could not be queued.
    #[error(transparent)]
    Bot(#[from] BotError),

    /// Connection I/O failed.
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    /// A runtime task panicked or was cancelled.
    #[error("Runtime task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
