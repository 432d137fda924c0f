//! Error types for command assembly, destination binding and resolution.
//!
//! [`RegistryError`] and [`BindingError`] signal construction-time defects in
//! the command tree or a destination struct. [`ResolveError`] is the only
//! kind produced by user input.

use thiserror::Error;

use crate::ParamKind;

/// Command tree assembly failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The id was not issued by this registry.
    #[error("unknown command id {0}")]
    UnknownCommand(usize),

    /// Parameters were registered for a command more than once.
    #[error("parameters already registered for command '{0}'")]
    AlreadyRegistered(String),

    /// The command already has a parent, or is the root.
    #[error("command '{0}' is already attached")]
    AlreadyAttached(String),

    /// Attaching would make a command its own ancestor.
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    /// A registered command does not reach the root at finalization.
    #[error("command '{0}' is not attached to the root command")]
    Detached(String),

    /// Two registered commands resolve to the same path.
    #[error("duplicate command path: {0}")]
    DuplicatePath(String),

    /// Flags for a parameter were already installed on the clap command.
    #[error("flag '{flag}' is already bound on command '{command}'")]
    AlreadyBound { command: String, flag: String },
}

/// Destination binding table failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A destination field names a key with no descriptor.
    #[error("no parameter named '{0}' to bind")]
    UnknownParameter(String),

    /// The setter kind differs from the declared kind.
    #[error("parameter '{name}' is declared as {declared} but bound as {bound}")]
    KindMismatch {
        name: String,
        declared: ParamKind,
        bound: ParamKind,
    },

    /// Two destination fields bind the same key.
    #[error("parameter '{0}' is bound more than once")]
    DuplicateBinding(String),
}

/// Parameter resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No flag, environment value or default for a required parameter.
    #[error("required parameter '{name}' is not set{}", env_hint(.name, .env_var))]
    MissingRequired {
        name: String,
        env_var: Option<String>,
    },

    /// A supplied value cannot be coerced to the declared kind.
    #[error("invalid value '{value}' for parameter '{name}': expected {kind}")]
    InvalidValue {
        name: String,
        value: String,
        kind: ParamKind,
    },
}

impl ResolveError {
    /// Returns the logical name of the offending parameter.
    pub fn param_name(&self) -> &str {
        match self {
            Self::MissingRequired { name, .. } | Self::InvalidValue { name, .. } => name,
        }
    }
}

fn env_hint(name: &str, env_var: &Option<String>) -> String {
    match env_var {
        Some(var) => format!(" (use --{name} or set {var})"),
        None => format!(" (use --{name})"),
    }
}
