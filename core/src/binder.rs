//! Installs descriptors as clap flags and reads explicit values back.
//!
//! Defaults and environment aliases are shown in help but never installed
//! into clap, so [`FlagSource`] for [`ArgMatches`] reports only values that
//! were typed on the command line and precedence stays with the resolver.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::error::RegistryError;
use crate::resolve::FlagSource;
use crate::{DescriptorSet, ParamDescriptor, ParamKind};

/// Registers one flag per descriptor on `cmd`.
///
/// - String and Int: single value, a later occurrence overrides an earlier one.
/// - Bool: `--flag` means `true`; `--flag=false` is accepted.
/// - StringArray: repeatable, values are also split on `,`.
///
/// # Errors
///
/// Returns [`RegistryError::AlreadyBound`] if `cmd` already has an argument
/// with one of the descriptor names.
///
/// # Examples
///
/// ```
/// use clap::Command;
/// use konflux_task_core::{DescriptorSet, FlagSource, ParamDescriptor, bind_flags};
///
/// let params = DescriptorSet::new([
///     ParamDescriptor::string_array("tags").with_short('t'),
///     ParamDescriptor::boolean("verbose").with_short('v').with_default("false"),
/// ])
/// .unwrap();
/// let cmd = bind_flags(Command::new("apply-tags"), &params).unwrap();
///
/// let matches = cmd
///     .try_get_matches_from(["apply-tags", "-t", "a", "--tags", "b,c", "-v"])
///     .unwrap();
/// assert_eq!(
///     matches.explicit_values("tags"),
///     Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
/// );
/// assert_eq!(matches.explicit_values("verbose"), Some(vec!["true".to_string()]));
/// ```
pub fn bind_flags(cmd: Command, params: &DescriptorSet) -> Result<Command, RegistryError> {
    let existing = params
        .iter()
        .find(|desc| cmd.get_arguments().any(|arg| arg.get_id().as_str() == desc.name));
    if let Some(desc) = existing {
        return Err(RegistryError::AlreadyBound {
            command: cmd.get_name().to_string(),
            flag: desc.name.to_string(),
        });
    }

    Ok(params.iter().fold(cmd, |cmd, desc| cmd.arg(flag_arg(desc))))
}

fn flag_arg(desc: &ParamDescriptor) -> Arg {
    let mut arg = Arg::new(desc.name).long(desc.name).help(help_text(desc));
    if let Some(short) = desc.short {
        arg = arg.short(short);
    }

    match desc.kind {
        ParamKind::String => arg
            .action(ArgAction::Set)
            .value_name("STRING")
            .overrides_with(desc.name),
        ParamKind::Int => arg
            .action(ArgAction::Set)
            .value_name("INT")
            .allow_negative_numbers(true)
            .overrides_with(desc.name),
        ParamKind::Bool => arg
            .action(ArgAction::Set)
            .value_name("BOOL")
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .overrides_with(desc.name),
        ParamKind::StringArray => arg
            .action(ArgAction::Append)
            .value_name("VALUE")
            .value_delimiter(','),
    }
}

fn help_text(desc: &ParamDescriptor) -> String {
    let mut help = desc.usage.to_string();
    if desc.required {
        help.push_str(" (required)");
    }
    if let Some(var) = desc.env_var {
        help.push_str(&format!(" [env: {var}]"));
    }
    if desc.has_default() {
        help.push_str(&format!(" [default: {}]", desc.default_value));
    }
    help.trim_start().to_string()
}

impl FlagSource for ArgMatches {
    fn explicit_values(&self, name: &str) -> Option<Vec<String>> {
        if self.value_source(name) != Some(ValueSource::CommandLine) {
            return None;
        }
        let values = self.try_get_many::<String>(name).ok().flatten()?;
        Some(values.cloned().collect())
    }
}
