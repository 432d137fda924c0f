//! Parameter value resolution.
//!
//! After flag parsing, each descriptor's final value is chosen by precedence:
//! an explicit command-line flag, then the environment alias, then the
//! declared default. The value is coerced to the descriptor's [`ParamKind`]
//! and written into a typed destination through a [`ParamBindings`] table,
//! a closed set of per-kind setter functions checked against the
//! [`DescriptorSet`] once, when the table is bound.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use konflux_task_core::*;
//!
//! #[derive(Debug, Default)]
//! struct CloneParams {
//!     url: String,
//!     branch: String,
//!     depth: i64,
//! }
//!
//! let params = DescriptorSet::new([
//!     ParamDescriptor::string("url").with_env("GIT_REPO_URL").required(),
//!     ParamDescriptor::string("branch").with_env("GIT_BRANCH").with_default("main"),
//!     ParamDescriptor::int("depth"),
//! ])
//! .unwrap();
//!
//! let bound = ParamBindings::<CloneParams>::new()
//!     .string("url", |p, v| p.url = v)
//!     .string("branch", |p, v| p.branch = v)
//!     .int("depth", |p, v| p.depth = v)
//!     .bind(&params)
//!     .unwrap();
//!
//! let flags = HashMap::from([("depth".to_string(), vec!["1".to_string()])]);
//! let env = HashMap::from([("GIT_REPO_URL".to_string(), "https://x/y.git".to_string())]);
//!
//! let resolved = bound.resolve(&flags, &env).unwrap();
//! assert_eq!(resolved.url, "https://x/y.git");
//! assert_eq!(resolved.branch, "main");
//! assert_eq!(resolved.depth, 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{BindingError, ResolveError};
use crate::{DescriptorSet, ParamDescriptor, ParamKind};

/// Source of values supplied explicitly on the command line.
pub trait FlagSource {
    /// Returns the values given for `name` in command-line order, or `None`
    /// if the flag was not supplied.
    fn explicit_values(&self, name: &str) -> Option<Vec<String>>;
}

impl FlagSource for HashMap<String, Vec<String>> {
    fn explicit_values(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).cloned()
    }
}

/// Source of environment variables.
///
/// Variables set to the empty string count as absent.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Flag,
    Env,
    Default,
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    String(String),
    Bool(bool),
    Int(i64),
    StringArray(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::StringArray(v) => f.write_str(&v.join(", ")),
        }
    }
}

/// Typed setter for one destination field, keyed by value kind.
pub enum Setter<T> {
    String(fn(&mut T, String)),
    Bool(fn(&mut T, bool)),
    Int(fn(&mut T, i64)),
    StringArray(fn(&mut T, Vec<String>)),
}

impl<T> Setter<T> {
    /// Returns the kind of value this setter accepts.
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::String(_) => ParamKind::String,
            Self::Bool(_) => ParamKind::Bool,
            Self::Int(_) => ParamKind::Int,
            Self::StringArray(_) => ParamKind::StringArray,
        }
    }

    /// Coerces `raw` to this setter's kind and stores it in `target`.
    fn assign(
        &self,
        target: &mut T,
        desc: &ParamDescriptor,
        raw: RawValue,
    ) -> Result<(), ResolveError> {
        match self {
            Self::String(set) => set(target, raw.into_last()),
            Self::Bool(set) => set(target, coerce_bool(desc, raw)?),
            Self::Int(set) => set(target, coerce_int(desc, raw)?),
            Self::StringArray(set) => set(target, raw.into_list()),
        }
        Ok(())
    }
}

/// Unchecked table mapping descriptor keys to destination setters.
///
/// Build one per destination type and check it with
/// [`bind`](ParamBindings::bind).
pub struct ParamBindings<T> {
    entries: Vec<(&'static str, Setter<T>)>,
}

impl<T> Default for ParamBindings<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ParamBindings<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, key: &'static str, set: fn(&mut T, String)) -> Self {
        self.with(key, Setter::String(set))
    }

    pub fn boolean(self, key: &'static str, set: fn(&mut T, bool)) -> Self {
        self.with(key, Setter::Bool(set))
    }

    pub fn int(self, key: &'static str, set: fn(&mut T, i64)) -> Self {
        self.with(key, Setter::Int(set))
    }

    pub fn string_array(self, key: &'static str, set: fn(&mut T, Vec<String>)) -> Self {
        self.with(key, Setter::StringArray(set))
    }

    /// Adds a binding for `key`.
    pub fn with(mut self, key: &'static str, setter: Setter<T>) -> Self {
        self.entries.push((key, setter));
        self
    }

    /// Checks every binding against `params`.
    ///
    /// Descriptors without a binding are still resolved (so required-ness and
    /// coercion are enforced) but their values are not stored.
    ///
    /// # Errors
    ///
    /// Returns a [`BindingError`] for a key with no descriptor, a key bound
    /// twice, or a setter whose kind differs from the declared kind.
    pub fn bind(self, params: &DescriptorSet) -> Result<BoundParams<'_, T>, BindingError> {
        let mut setters: HashMap<&'static str, Setter<T>> = HashMap::new();
        for (key, setter) in self.entries {
            let Some(desc) = params.get(key) else {
                return Err(BindingError::UnknownParameter(key.to_string()));
            };
            if desc.kind != setter.kind() {
                return Err(BindingError::KindMismatch {
                    name: key.to_string(),
                    declared: desc.kind,
                    bound: setter.kind(),
                });
            }
            if setters.insert(key, setter).is_some() {
                return Err(BindingError::DuplicateBinding(key.to_string()));
            }
        }

        let entries = params
            .iter()
            .map(|desc| (desc, setters.remove(desc.name)))
            .collect();
        Ok(BoundParams { entries })
    }
}

/// Binding table checked against a [`DescriptorSet`], ready to resolve.
pub struct BoundParams<'a, T> {
    entries: Vec<(&'a ParamDescriptor, Option<Setter<T>>)>,
}

impl<T: Default> BoundParams<'_, T> {
    /// Resolves every parameter and returns a freshly populated destination.
    ///
    /// Nothing is returned unless every parameter resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingRequired`] when a required parameter has
    /// no flag, environment value or default, and
    /// [`ResolveError::InvalidValue`] when a value cannot be coerced.
    pub fn resolve(&self, flags: &impl FlagSource, env: &impl EnvSource) -> Result<T, ResolveError> {
        let mut target = T::default();
        for (desc, setter) in &self.entries {
            let Some((raw, origin)) = raw_value(desc, flags, env)? else {
                continue;
            };
            debug!(param = desc.name, ?origin, ?raw, "resolved parameter");
            match setter {
                Some(setter) => setter.assign(&mut target, desc, raw)?,
                None => {
                    coerce(desc, raw)?;
                }
            }
        }
        Ok(target)
    }
}

/// Resolves one descriptor's value by precedence: flag, environment, default.
///
/// Returns `Ok(None)` for an optional parameter with no value anywhere.
///
/// # Errors
///
/// See [`BoundParams::resolve`].
pub fn resolve_value(
    desc: &ParamDescriptor,
    flags: &impl FlagSource,
    env: &impl EnvSource,
) -> Result<Option<(ParamValue, Origin)>, ResolveError> {
    match raw_value(desc, flags, env)? {
        Some((raw, origin)) => Ok(Some((coerce(desc, raw)?, origin))),
        None => Ok(None),
    }
}

/// Picks the uncoerced value by precedence and enforces required-ness.
fn raw_value(
    desc: &ParamDescriptor,
    flags: &impl FlagSource,
    env: &impl EnvSource,
) -> Result<Option<(RawValue, Origin)>, ResolveError> {
    if let Some(values) = flags.explicit_values(desc.name).filter(|v| !v.is_empty()) {
        return Ok(Some((RawValue::Flag(values), Origin::Flag)));
    }
    if let Some(text) = desc.env_var.and_then(|var| env.var(var)) {
        return Ok(Some((RawValue::Text(text), Origin::Env)));
    }
    if desc.has_default() {
        let text = desc.default_value.to_string();
        return Ok(Some((RawValue::Text(text), Origin::Default)));
    }
    if desc.required {
        return Err(ResolveError::MissingRequired {
            name: desc.name.to_string(),
            env_var: desc.env_var.map(String::from),
        });
    }
    Ok(None)
}

/// Uncoerced value: discrete flag occurrences, or one environment/default
/// string.
#[derive(Debug)]
enum RawValue {
    Flag(Vec<String>),
    Text(String),
}

impl RawValue {
    /// Scalars take the last occurrence.
    fn into_last(self) -> String {
        match self {
            Self::Flag(mut values) => values.pop().unwrap_or_default(),
            Self::Text(text) => text,
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            Self::Flag(values) => values,
            Self::Text(text) => split_list(&text),
        }
    }
}

fn coerce(desc: &ParamDescriptor, raw: RawValue) -> Result<ParamValue, ResolveError> {
    let value = match desc.kind {
        ParamKind::String => ParamValue::String(raw.into_last()),
        ParamKind::Bool => ParamValue::Bool(coerce_bool(desc, raw)?),
        ParamKind::Int => ParamValue::Int(coerce_int(desc, raw)?),
        ParamKind::StringArray => ParamValue::StringArray(raw.into_list()),
    };
    Ok(value)
}

fn coerce_bool(desc: &ParamDescriptor, raw: RawValue) -> Result<bool, ResolveError> {
    let text = raw.into_last();
    parse_bool(&text).ok_or_else(|| invalid_value(desc, text))
}

fn coerce_int(desc: &ParamDescriptor, raw: RawValue) -> Result<i64, ResolveError> {
    let text = raw.into_last();
    parse_int(&text).ok_or_else(|| invalid_value(desc, text))
}

fn invalid_value(desc: &ParamDescriptor, value: String) -> ResolveError {
    ResolveError::InvalidValue {
        name: desc.name.to_string(),
        value,
        kind: desc.kind,
    }
}

/// Splits a comma-joined list, dropping empty segments.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_int(text: &str) -> Option<i64> {
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct TestParams {
        branch: String,
        depth: i64,
        verbose: bool,
        tags: Vec<String>,
    }

    fn params() -> DescriptorSet {
        DescriptorSet::new([
            ParamDescriptor::string("url").with_env("GIT_REPO_URL").required(),
            ParamDescriptor::string("branch")
                .with_short('b')
                .with_env("GIT_BRANCH")
                .with_default("main"),
            ParamDescriptor::int("depth").with_short('d'),
            ParamDescriptor::boolean("verbose")
                .with_env("VERBOSE")
                .with_default("false"),
            ParamDescriptor::string_array("tags").with_env("TAGS"),
        ])
        .unwrap()
    }

    fn bindings() -> ParamBindings<TestParams> {
        ParamBindings::<TestParams>::new()
            .string("branch", |p, v| p.branch = v)
            .int("depth", |p, v| p.depth = v)
            .boolean("verbose", |p, v| p.verbose = v)
            .string_array("tags", |p, v| p.tags = v)
    }

    fn flags(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(
        flags: &HashMap<String, Vec<String>>,
        env: &HashMap<String, String>,
    ) -> Result<TestParams, ResolveError> {
        let params = params();
        let bound = bindings().bind(&params).unwrap();
        bound.resolve(flags, env)
    }

    #[test]
    fn test_precedence_flag_env_default() {
        let base_env = [("GIT_REPO_URL", "https://example.com/repo.git")];

        let with_all = resolve(
            &flags(&[("branch", &["feature"])]),
            &env(&[base_env[0], ("GIT_BRANCH", "devel")]),
        )
        .unwrap();
        assert_eq!(with_all.branch, "feature");

        let without_flag =
            resolve(&flags(&[]), &env(&[base_env[0], ("GIT_BRANCH", "devel")])).unwrap();
        assert_eq!(without_flag.branch, "devel");

        let defaults_only = resolve(&flags(&[]), &env(&base_env)).unwrap();
        assert_eq!(defaults_only.branch, "main");
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let err = resolve(&flags(&[]), &env(&[])).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequired {
                name: "url".to_string(),
                env_var: Some("GIT_REPO_URL".to_string()),
            }
        );
    }

    #[test]
    fn test_empty_env_value_counts_as_absent() {
        let err = resolve(&flags(&[]), &env(&[("GIT_REPO_URL", "")])).unwrap_err();
        assert_eq!(err.param_name(), "url");
    }

    #[test]
    fn test_required_unbound_parameter_still_enforced() {
        // `url` has no binding in `bindings()` but is required.
        let ok = resolve(&flags(&[("url", &["https://x"])]), &env(&[])).unwrap();
        assert_eq!(ok, TestParams {
            branch: "main".to_string(),
            ..TestParams::default()
        });
    }

    #[test]
    fn test_invalid_int_names_parameter_and_value() {
        let err = resolve(
            &flags(&[("url", &["https://x"]), ("depth", &["abc"])]),
            &env(&[]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidValue {
                name: "depth".to_string(),
                value: "abc".to_string(),
                kind: ParamKind::Int,
            }
        );
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        let resolved = resolve(
            &flags(&[("url", &["https://x"])]),
            &env(&[("VERBOSE", "TRUE")]),
        )
        .unwrap();
        assert!(resolved.verbose);

        let err = resolve(
            &flags(&[("url", &["https://x"])]),
            &env(&[("VERBOSE", "yes")]),
        )
        .unwrap_err();
        assert_eq!(err.param_name(), "verbose");
    }

    #[test]
    fn test_scalar_flag_takes_last_occurrence() {
        let resolved = resolve(
            &flags(&[("url", &["https://x"]), ("depth", &["1", "5"])]),
            &env(&[]),
        )
        .unwrap();
        assert_eq!(resolved.depth, 5);
    }

    #[test]
    fn test_array_from_flags_and_env() {
        let from_flags = resolve(
            &flags(&[("url", &["https://x"]), ("tags", &["a", "b"])]),
            &env(&[("TAGS", "x,y")]),
        )
        .unwrap();
        assert_eq!(from_flags.tags, vec!["a", "b"]);

        let from_env = resolve(
            &flags(&[("url", &["https://x"])]),
            &env(&[("TAGS", "x,,y,")]),
        )
        .unwrap();
        assert_eq!(from_env.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_optional_without_value_keeps_default() {
        let resolved = resolve(&flags(&[("url", &["https://x"])]), &env(&[])).unwrap();
        assert_eq!(resolved.depth, 0);
        assert!(resolved.tags.is_empty());
        assert!(!resolved.verbose);
    }

    #[test]
    fn test_bind_rejects_unknown_key() {
        let params = params();
        let result = ParamBindings::<TestParams>::new()
            .string("revision", |p, v| p.branch = v)
            .bind(&params);
        assert!(matches!(
            result,
            Err(BindingError::UnknownParameter(key)) if key == "revision"
        ));
    }

    #[test]
    fn test_bind_rejects_kind_mismatch() {
        let params = params();
        let result = ParamBindings::<TestParams>::new()
            .string("depth", |p, v| p.branch = v)
            .bind(&params);
        assert!(matches!(
            result,
            Err(BindingError::KindMismatch {
                declared: ParamKind::Int,
                bound: ParamKind::String,
                ..
            })
        ));
    }

    #[test]
    fn test_bind_rejects_duplicate_binding() {
        let params = params();
        let result = bindings()
            .string("branch", |p, v| p.branch = v)
            .bind(&params);
        assert!(matches!(
            result,
            Err(BindingError::DuplicateBinding(key)) if key == "branch"
        ));
    }

    #[test]
    fn test_resolve_value_reports_origin() {
        let params = params();
        let branch = params.get("branch").unwrap();
        let value = resolve_value(branch, &flags(&[]), &env(&[("GIT_BRANCH", "devel")])).unwrap();
        assert_eq!(
            value,
            Some((ParamValue::String("devel".to_string()), Origin::Env))
        );

        let depth = params.get("depth").unwrap();
        assert_eq!(resolve_value(depth, &flags(&[]), &env(&[])).unwrap(), None);
    }

    #[test]
    fn test_unbound_parameter_is_still_coerced() {
        let params = params();
        let bound = ParamBindings::<TestParams>::new()
            .string("branch", |p, v| p.branch = v)
            .bind(&params)
            .unwrap();

        let err = bound
            .resolve(
                &flags(&[("url", &["https://x"]), ("depth", &["deep"])]),
                &env(&[]),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidValue {
                name: "depth".to_string(),
                value: "deep".to_string(),
                kind: ParamKind::Int,
            }
        );
    }

    #[test]
    fn test_setter_and_resolve_value_agree() {
        let params = params();
        let flags = flags(&[("url", &["https://x"]), ("depth", &["7"])]);
        let env = env(&[("VERBOSE", "True"), ("TAGS", "a,b")]);

        let resolved = bindings().bind(&params).unwrap().resolve(&flags, &env).unwrap();
        let value = |name: &str| {
            resolve_value(params.get(name).unwrap(), &flags, &env)
                .unwrap()
                .map(|(value, _)| value)
        };

        assert_eq!(value("depth"), Some(ParamValue::Int(resolved.depth)));
        assert_eq!(value("verbose"), Some(ParamValue::Bool(resolved.verbose)));
        assert_eq!(value("tags"), Some(ParamValue::StringArray(resolved.tags)));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a,b,,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
