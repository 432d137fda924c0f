//! Command tree assembly.
//!
//! Builds the clap command tree and, in the same pass, registers every task
//! command's parameter table with a [`CommandRegistry`]. The registry is
//! finalized only after the last subcommand is attached.

use clap::Command;
use konflux_task_core::{ArrayFlagTable, CommandId, CommandRegistry, bind_flags};

use crate::commands::{ApplyTags, GitClone, ImageBuild, TaskCommand};
use crate::error::Result;

pub const BIN_NAME: &str = "konflux-task-cli";

const PRECEDENCE_NOTE: &str = "Parameters can be passed as flags or via environment variables. \
Flags take precedence over environment variables, which take precedence over defaults.";

/// The assembled clap tree and its finalized array flag table.
pub struct CommandTree {
    pub cli: Command,
    pub array_flags: ArrayFlagTable,
}

/// Assembles the full command tree.
pub fn build() -> Result<CommandTree> {
    let mut registry = CommandRegistry::new(BIN_NAME);
    let root = registry.root();

    let gitclone = task_command::<GitClone>(&mut registry, root)?;

    let image_id = registry.add_command("image");
    registry.attach(root, image_id)?;
    let image = Command::new("image")
        .about("A subcommand group to work with container images")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(task_command::<ImageBuild>(&mut registry, image_id)?)
        .subcommand(task_command::<ApplyTags>(&mut registry, image_id)?);

    let cli = Command::new(BIN_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Helper commands for Konflux build pipeline tasks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(gitclone)
        .subcommand(image);

    let array_flags = registry.finalize()?;
    Ok(CommandTree { cli, array_flags })
}

/// Creates the clap command for `C` under `parent`, registering its
/// parameters and installing its flags.
fn task_command<C: TaskCommand>(
    registry: &mut CommandRegistry,
    parent: CommandId,
) -> Result<Command> {
    let id = registry.add_command(C::NAME);
    registry.attach(parent, id)?;

    let params = C::descriptor_set()?;
    registry.register(id, &params)?;

    let cmd = Command::new(C::NAME)
        .about(C::ABOUT)
        .after_help(PRECEDENCE_NOTE);
    Ok(bind_flags(cmd, &params)?)
}
