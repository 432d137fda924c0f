//! Parameter descriptor definitions.
//!
//! A [`ParamDescriptor`] is the declarative record of one configurable
//! parameter: its flag name, optional short alias and environment alias, its
//! [`ParamKind`], default, usage text and whether it is required. Descriptors
//! are `const`-constructible so each command can keep its table in a `static`.
//! A [`DescriptorSet`] is the validated, ordered collection owned by one
//! command.

use std::fmt;
use std::slice;

use serde::Serialize;

use crate::validate::{ValidationError, validate_descriptors};

/// Value kind of a parameter.
///
/// The set is closed: every parameter resolves to exactly one of these.
///
/// # Examples
///
/// ```
/// use konflux_task_core::ParamKind;
///
/// assert!(ParamKind::StringArray.is_array());
/// assert!(!ParamKind::Int.is_array());
/// assert_eq!(ParamKind::Int.to_string(), "integer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// Free text, passed through unchanged.
    String,
    /// `true`/`false`, or flag presence.
    Bool,
    /// Base-10 signed integer.
    Int,
    /// Sequence of strings.
    StringArray,
}

impl ParamKind {
    /// Returns true for kinds that accept more than one value.
    pub fn is_array(self) -> bool {
        matches!(self, Self::StringArray)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::StringArray => "string array",
        };
        f.write_str(label)
    }
}

/// Declarative description of one command parameter.
///
/// Use one of the kind constructors ([`string`](ParamDescriptor::string),
/// [`boolean`](ParamDescriptor::boolean), [`int`](ParamDescriptor::int),
/// [`string_array`](ParamDescriptor::string_array)) and chain the `with_*`
/// builders. All of them are `const fn`.
///
/// # Examples
///
/// ```
/// use konflux_task_core::{ParamDescriptor, ParamKind};
///
/// const BRANCH: ParamDescriptor = ParamDescriptor::string("branch")
///     .with_short('b')
///     .with_env("GIT_BRANCH")
///     .with_default("main")
///     .with_usage("Branch to clone from");
///
/// assert_eq!(BRANCH.kind, ParamKind::String);
/// assert_eq!(BRANCH.long_flag(), "--branch");
/// assert_eq!(BRANCH.short_flag().as_deref(), Some("-b"));
/// assert!(!BRANCH.required);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
    /// Long flag name without dashes, also the logical binding key.
    pub name: &'static str,
    /// Single-character alias (`-b`).
    pub short: Option<char>,
    /// Environment variable consulted when the flag is absent.
    pub env_var: Option<&'static str>,
    /// Value kind.
    pub kind: ParamKind,
    /// String-encoded default; empty means no default.
    pub default_value: &'static str,
    /// Help text.
    pub usage: &'static str,
    /// Fail resolution when no flag, environment value or default is found.
    pub required: bool,
}

impl ParamDescriptor {
    /// Creates a descriptor with the given name and kind and no extras.
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            short: None,
            env_var: None,
            kind,
            default_value: "",
            usage: "",
            required: false,
        }
    }

    /// Creates a [`ParamKind::String`] descriptor.
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, ParamKind::String)
    }

    /// Creates a [`ParamKind::Bool`] descriptor.
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    /// Creates a [`ParamKind::Int`] descriptor.
    pub const fn int(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int)
    }

    /// Creates a [`ParamKind::StringArray`] descriptor.
    pub const fn string_array(name: &'static str) -> Self {
        Self::new(name, ParamKind::StringArray)
    }

    pub const fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub const fn with_env(mut self, env_var: &'static str) -> Self {
        self.env_var = Some(env_var);
        self
    }

    pub const fn with_default(mut self, default_value: &'static str) -> Self {
        self.default_value = default_value;
        self
    }

    pub const fn with_usage(mut self, usage: &'static str) -> Self {
        self.usage = usage;
        self
    }

    /// Marks the parameter as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns true if a non-empty default is declared.
    pub fn has_default(&self) -> bool {
        !self.default_value.is_empty()
    }

    /// Returns the long spelling, e.g. `--branch`.
    pub fn long_flag(&self) -> String {
        format!("--{}", self.name)
    }

    /// Returns the short spelling, e.g. `-b`, if an alias is declared.
    pub fn short_flag(&self) -> Option<String> {
        self.short.map(|c| format!("-{c}"))
    }

    /// Returns every command-line spelling of this parameter, long form first.
    pub fn spellings(&self) -> Vec<String> {
        std::iter::once(self.long_flag())
            .chain(self.short_flag())
            .collect()
    }
}

/// Validated, ordered set of descriptors owned by one command.
///
/// Created once while the command tree is assembled and read-only afterwards.
/// Declaration order is preserved for help output and resolution.
///
/// # Examples
///
/// ```
/// use konflux_task_core::{DescriptorSet, ParamDescriptor};
///
/// let set = DescriptorSet::new([
///     ParamDescriptor::string("image-url").with_short('i').required(),
///     ParamDescriptor::string_array("tags").with_short('t'),
/// ])
/// .unwrap();
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.array_flag_spellings(), vec!["--tags", "-t"]);
/// assert!(set.get("image-url").is_some());
///
/// // Duplicate names are rejected.
/// assert!(DescriptorSet::new([
///     ParamDescriptor::string("tags"),
///     ParamDescriptor::string_array("tags"),
/// ])
/// .is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DescriptorSet {
    params: Vec<ParamDescriptor>,
}

impl DescriptorSet {
    /// Builds a set, rejecting structurally invalid tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found by
    /// [`validate_descriptors`].
    pub fn new(params: impl IntoIterator<Item = ParamDescriptor>) -> Result<Self, ValidationError> {
        let params: Vec<ParamDescriptor> = params.into_iter().collect();
        if let Some(err) = validate_descriptors(&params).into_iter().next() {
            return Err(err);
        }
        Ok(Self { params })
    }

    /// Looks up a descriptor by its logical key.
    pub fn get(&self, key: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| p.name == key)
    }

    pub fn iter(&self) -> slice::Iter<'_, ParamDescriptor> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the long and short spellings of every array-typed parameter.
    pub fn array_flag_spellings(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.kind.is_array())
            .flat_map(ParamDescriptor::spellings)
            .collect()
    }
}

impl<'a> IntoIterator for &'a DescriptorSet {
    type Item = &'a ParamDescriptor;
    type IntoIter = slice::Iter<'a, ParamDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
