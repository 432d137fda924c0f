//! Error type for the CLI binary.

use konflux_task_core::{BindingError, RegistryError, ResolveError, ValidationError};
use thiserror::Error;

/// Errors that can end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// A static parameter table is malformed.
    #[error("invalid parameter table for '{command}': {source}")]
    Descriptors {
        command: &'static str,
        #[source]
        source: ValidationError,
    },

    /// The command tree could not be assembled.
    #[error("command tree assembly failed: {0}")]
    Registry(#[from] RegistryError),

    /// A parameter struct binding does not match its table.
    #[error("parameter binding failed: {0}")]
    Binding(#[from] BindingError),

    /// Missing or malformed parameter value.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Resolved parameters rejected by the subcommand.
    #[error("{0}")]
    InvalidParams(String),

    /// The parsed command has no task behind it.
    #[error("no handler for command '{0}'")]
    UnhandledCommand(String),

    /// A process argument is not valid UTF-8.
    #[error("argument is not valid UTF-8: {0}")]
    NonUtf8Argument(String),

    /// Output serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;
