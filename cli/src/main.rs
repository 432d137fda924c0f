mod commands;
mod error;
mod tree;

use std::process;

use clap::ArgMatches;
use konflux_task_core::{EnvSource, ProcessEnv, expand_array_args};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{ApplyTags, GitClone, ImageBuild, Outcome, TaskCommand, execute};
use error::{CliError, Result};
use tree::BIN_NAME;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let tree = tree::build()?;

    let argv = expand_array_args(&process_args()?, &tree.array_flags);
    debug!(?argv, "rewritten arguments");

    let matches = match tree
        .cli
        .try_get_matches_from(std::iter::once(BIN_NAME.to_string()).chain(argv))
    {
        Ok(matches) => matches,
        Err(err) => err.exit(),
    };

    dispatch(&matches, &ProcessEnv)
}

/// Runs the task command selected in `matches`.
fn dispatch(matches: &ArgMatches, env: &impl EnvSource) -> Result<()> {
    match matches.subcommand() {
        Some(("gitclone", m)) => run_task::<GitClone>("gitclone", m, env),
        Some(("image", image)) => match image.subcommand() {
            Some(("build", m)) => run_task::<ImageBuild>("image build", m, env),
            Some(("apply-tags", m)) => run_task::<ApplyTags>("image apply-tags", m, env),
            other => Err(unhandled("image", other)),
        },
        other => Err(unhandled("", other)),
    }
}

fn unhandled(parent: &str, sub: Option<(&str, &ArgMatches)>) -> CliError {
    let path = match sub {
        Some((name, _)) if parent.is_empty() => name.to_string(),
        Some((name, _)) => format!("{parent} {name}"),
        None => parent.to_string(),
    };
    CliError::UnhandledCommand(path)
}

fn run_task<C: TaskCommand>(
    path: &str,
    matches: &ArgMatches,
    env: &impl EnvSource,
) -> Result<()> {
    let outcome = execute::<C>(path, matches, env)?;
    print_outcome(&outcome)
}

fn print_outcome<P: Serialize>(outcome: &Outcome<P>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

/// Process arguments without the program name.
fn process_args() -> Result<Vec<String>> {
    std::env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| CliError::NonUtf8Argument(raw.to_string_lossy().into_owned()))
        })
        .collect()
}
