//! Argument vector rewriting ahead of flag parsing.
//!
//! The flag parser accepts array values only as repeated occurrences
//! (`--tags a --tags b`) or comma-joined values (`--tags a,b`). This pass
//! desugars the variadic form `--tags a b c` into repeated occurrences, using
//! the finalized [`ArrayFlagTable`] to decide which flags are arrays for the
//! command being invoked.
//!
//! Any token sequence has a defined rewriting; this pass never fails.

use tracing::debug;

use crate::ArrayFlagTable;

/// Token after which every argument is positional and copied verbatim.
pub const ARG_SEPARATOR: &str = "--";

/// Rewrites `argv` (without the program name) so space-separated array values
/// become repeated flag occurrences.
///
/// The command path is the run of leading tokens that do not start with `-`.
/// Only array flags registered for exactly that path are rewritten.
///
/// - `--` stops rewriting; it and everything after it are copied unchanged.
/// - `--tags=a,b` becomes `--tags a --tags b`; empty segments are dropped.
///   A segment starting with `-` stays attached (`--tags=-b`).
/// - `--tags a b` becomes `--tags a --tags b`; values stop at the next token
///   starting with `-`.
/// - An array flag with no values is omitted.
/// - Clustered short flags (`-vt a b`) are not split, so the array alias
///   inside a cluster is not expanded; only a standalone `-t` is.
///
/// # Examples
///
/// ```
/// use konflux_task_core::{CommandRegistry, DescriptorSet, ParamDescriptor, expand_array_args};
///
/// let mut registry = CommandRegistry::new("tool");
/// let apply = registry.add_command("apply-tags");
/// registry.attach(registry.root(), apply).unwrap();
/// let params = DescriptorSet::new([
///     ParamDescriptor::string_array("tags").with_short('t'),
/// ])
/// .unwrap();
/// registry.register(apply, &params).unwrap();
/// let table = registry.finalize().unwrap();
///
/// let out = expand_array_args(&["apply-tags", "--tags", "a", "b", "-v"], &table);
/// assert_eq!(out, ["apply-tags", "--tags", "a", "--tags", "b", "-v"]);
/// ```
pub fn expand_array_args<S: AsRef<str>>(argv: &[S], table: &ArrayFlagTable) -> Vec<String> {
    let path = command_path(argv);
    let array_flags = table.array_flags(&path);
    let is_array_flag = |flag: &str| array_flags.iter().any(|f| f == flag);

    let mut out = Vec::with_capacity(argv.len());
    let mut i = 0;
    while i < argv.len() {
        let arg = argv[i].as_ref();

        if arg == ARG_SEPARATOR {
            out.extend(argv[i..].iter().map(|a| a.as_ref().to_string()));
            break;
        }

        if arg.starts_with('-') {
            if let Some((flag, joined)) = arg.split_once('=') {
                if is_array_flag(flag) {
                    for value in joined.split(',').filter(|v| !v.is_empty()) {
                        if value.starts_with('-') {
                            // Attached, so the parser cannot mistake it for a flag.
                            out.push(format!("{flag}={value}"));
                        } else {
                            out.push(flag.to_string());
                            out.push(value.to_string());
                        }
                    }
                } else {
                    out.push(arg.to_string());
                }
                i += 1;
                continue;
            }
        }

        if is_array_flag(arg) {
            let mut j = i + 1;
            while j < argv.len() && is_array_value(argv[j].as_ref()) {
                out.push(arg.to_string());
                out.push(argv[j].as_ref().to_string());
                j += 1;
            }
            if j == i + 1 {
                debug!(flag = arg, "dropping array flag without values");
            }
            i = j;
            continue;
        }

        out.push(arg.to_string());
        i += 1;
    }

    out
}

/// Joins the leading non-flag tokens with single spaces.
fn command_path<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| arg.as_ref())
        .take_while(|arg| !arg.starts_with('-'))
        .collect::<Vec<&str>>()
        .join(" ")
}

fn is_array_value(arg: &str) -> bool {
    arg != ARG_SEPARATOR && !arg.starts_with('-')
}
