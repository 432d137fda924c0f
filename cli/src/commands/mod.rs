//! Subcommands and the shared resolve-validate-plan pipeline.
//!
//! Each subcommand implements [`TaskCommand`]: a static parameter table, a
//! typed parameter struct with its binding table, caller-side validation, and
//! the external tool invocations it hands off. Running those tools is the job
//! of the tool wrappers; this binary prints the plan.

pub mod apply_tags;
pub mod build;
pub mod gitclone;

use clap::ArgMatches;
use konflux_task_core::{DescriptorSet, EnvSource, ParamBindings, ParamDescriptor};
use serde::Serialize;
use tracing::info;

use crate::error::{CliError, Result};

pub use apply_tags::ApplyTags;
pub use build::ImageBuild;
pub use gitclone::GitClone;

/// A concrete subcommand driven by a declarative parameter table.
pub trait TaskCommand {
    /// Subcommand name as typed on the command line.
    const NAME: &'static str;
    /// One-line description for help output.
    const ABOUT: &'static str;

    type Params: Default + Serialize;

    /// Static parameter table.
    fn descriptors() -> &'static [ParamDescriptor];

    /// Binding of descriptor keys to [`Self::Params`] fields.
    fn bindings() -> ParamBindings<Self::Params>;

    fn verbose(params: &Self::Params) -> bool;

    /// Rejects semantically invalid parameters.
    fn validate(params: &Self::Params) -> Result<()>;

    /// External tool invocations for the resolved parameters.
    fn plan(params: &Self::Params) -> Vec<Invocation>;

    /// Validated descriptor set for this command.
    fn descriptor_set() -> Result<DescriptorSet> {
        DescriptorSet::new(Self::descriptors().iter().copied()).map_err(|source| {
            CliError::Descriptors {
                command: Self::NAME,
                source,
            }
        })
    }
}

/// One external program call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Result of one subcommand run, printed as JSON.
#[derive(Debug, Serialize)]
pub struct Outcome<P> {
    pub command: String,
    pub params: P,
    pub invocations: Vec<Invocation>,
}

/// Resolves, validates and plans one subcommand invocation.
///
/// `path` is the full command path used in log lines and output.
pub fn execute<C: TaskCommand>(
    path: &str,
    matches: &ArgMatches,
    env: &impl EnvSource,
) -> Result<Outcome<C::Params>> {
    info!("Starting {path}");

    let descriptors = C::descriptor_set()?;
    let params = C::bindings().bind(&descriptors)?.resolve(matches, env)?;

    if C::verbose(&params) {
        log_params(&params)?;
    }
    C::validate(&params)?;

    let invocations = C::plan(&params);
    info!(count = invocations.len(), "Finishing {path}");

    Ok(Outcome {
        command: path.to_string(),
        params,
        invocations,
    })
}

/// Logs every non-empty field of a parameter struct as `[param] name: value`.
fn log_params<P: Serialize>(params: &P) -> Result<()> {
    let serde_json::Value::Object(fields) = serde_json::to_value(params)? else {
        return Ok(());
    };
    for (name, value) in fields {
        let rendered = match value {
            serde_json::Value::String(s) if s.is_empty() => continue,
            serde_json::Value::Array(items) if items.is_empty() => continue,
            serde_json::Value::String(s) => s,
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), String::from))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        info!("[param] {name}: {rendered}");
    }
    Ok(())
}
