//! Descriptor table validation.
//!
//! Catches structural problems in a command's parameter table (empty or
//! duplicate names, clashing short aliases, malformed environment aliases,
//! defaults that cannot be coerced) before the table is registered.
//!
//! # Examples
//!
//! ```
//! use konflux_task_core::*;
//!
//! let params = [
//!     ParamDescriptor::string("url").with_env("GIT_REPO_URL").required(),
//!     ParamDescriptor::int("depth").with_short('d'),
//! ];
//! assert!(validate_descriptors(&params).is_empty());
//!
//! // `-h` is reserved for help
//! let bad = [ParamDescriptor::boolean("human").with_short('h')];
//! assert!(!validate_descriptors(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::resolve::{parse_bool, parse_int};
use crate::{ParamDescriptor, ParamKind};

/// Descriptor table validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Parameter name is empty or whitespace-only.
    #[error("parameter name cannot be empty")]
    EmptyName,
    /// Name starts with a dash or contains `=`, `,` or whitespace.
    #[error("invalid parameter name: {0}")]
    InvalidName(String),
    /// Two descriptors in the same table share a name.
    #[error("duplicate parameter: {0}")]
    DuplicateName(String),
    /// Short alias is not an ASCII alphanumeric, or is the reserved `h`.
    #[error("invalid short alias '-{short}' for parameter {name}")]
    InvalidShort { name: String, short: char },
    /// Two descriptors in the same table share a short alias.
    #[error("duplicate short alias: -{0}")]
    DuplicateShort(char),
    /// Environment alias is empty or not a portable variable name.
    #[error("invalid environment variable '{env_var}' for parameter {name}")]
    InvalidEnvVar { name: String, env_var: String },
    /// A required parameter also declares a default.
    #[error("required parameter {0} cannot have a default value")]
    RequiredWithDefault(String),
    /// The default cannot be coerced to the declared kind.
    #[error("default '{value}' of parameter {name} is not a valid {kind}")]
    InvalidDefault {
        name: String,
        value: String,
        kind: ParamKind,
    },
}

/// Validates a descriptor table.
///
/// Returns every problem found, in declaration order; an empty vector means
/// the table is usable.
pub fn validate_descriptors(params: &[ParamDescriptor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();
    let mut shorts = HashSet::new();

    for param in params {
        let name = param.name;
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        } else if name.starts_with('-')
            || name.contains(['=', ','])
            || name.chars().any(char::is_whitespace)
        {
            errors.push(ValidationError::InvalidName(name.to_string()));
        } else if !names.insert(name) {
            errors.push(ValidationError::DuplicateName(name.to_string()));
        }

        if let Some(short) = param.short {
            if !short.is_ascii_alphanumeric() || short == 'h' {
                errors.push(ValidationError::InvalidShort {
                    name: name.to_string(),
                    short,
                });
            } else if !shorts.insert(short) {
                errors.push(ValidationError::DuplicateShort(short));
            }
        }

        if let Some(env_var) = param.env_var {
            if !is_env_var_name(env_var) {
                errors.push(ValidationError::InvalidEnvVar {
                    name: name.to_string(),
                    env_var: env_var.to_string(),
                });
            }
        }

        if param.required && param.has_default() {
            errors.push(ValidationError::RequiredWithDefault(name.to_string()));
        }

        if param.has_default() && !default_coerces(param) {
            errors.push(ValidationError::InvalidDefault {
                name: name.to_string(),
                value: param.default_value.to_string(),
                kind: param.kind,
            });
        }
    }

    errors
}

fn is_env_var_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn default_coerces(param: &ParamDescriptor) -> bool {
    match param.kind {
        ParamKind::String | ParamKind::StringArray => true,
        ParamKind::Bool => parse_bool(param.default_value).is_some(),
        ParamKind::Int => parse_int(param.default_value).is_some(),
    }
}
