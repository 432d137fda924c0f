//! `gitclone`: clone a git repository.

use konflux_task_core::{ParamBindings, ParamDescriptor};
use serde::Serialize;

use super::{Invocation, TaskCommand};
use crate::error::{CliError, Result};

static DESCRIPTORS: [ParamDescriptor; 4] = [
    ParamDescriptor::string("url")
        .with_env("GIT_REPO_URL")
        .with_usage("Git URL to clone from")
        .required(),
    ParamDescriptor::string("branch")
        .with_short('b')
        .with_env("GIT_BRANCH")
        .with_default("main")
        .with_usage("Branch to clone from"),
    ParamDescriptor::int("depth")
        .with_short('d')
        .with_usage("Clone depth"),
    ParamDescriptor::boolean("verbose")
        .with_short('v')
        .with_env("VERBOSE")
        .with_default("false")
        .with_usage("Activates verbose mode"),
];

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct GitCloneParams {
    pub repo_url: String,
    pub branch: String,
    pub depth: i64,
    pub verbose: bool,
}

pub struct GitClone;

impl TaskCommand for GitClone {
    const NAME: &'static str = "gitclone";
    const ABOUT: &'static str = "Clones a git repository";

    type Params = GitCloneParams;

    fn descriptors() -> &'static [ParamDescriptor] {
        &DESCRIPTORS
    }

    fn bindings() -> ParamBindings<GitCloneParams> {
        ParamBindings::<Self::Params>::new()
            .string("url", |p, v| p.repo_url = v)
            .string("branch", |p, v| p.branch = v)
            .int("depth", |p, v| p.depth = v)
            .boolean("verbose", |p, v| p.verbose = v)
    }

    fn verbose(params: &GitCloneParams) -> bool {
        params.verbose
    }

    fn validate(params: &GitCloneParams) -> Result<()> {
        if params.repo_url.is_empty() {
            return Err(CliError::InvalidParams(
                "git repository url must be set".to_string(),
            ));
        }
        if !params.repo_url.starts_with("https://") {
            return Err(CliError::InvalidParams(
                "only https protocol is supported".to_string(),
            ));
        }
        if params.depth < 0 {
            return Err(CliError::InvalidParams(format!(
                "clone depth must not be negative, got {}",
                params.depth
            )));
        }
        Ok(())
    }

    fn plan(params: &GitCloneParams) -> Vec<Invocation> {
        let mut clone = Invocation::new("git")
            .args(["clone", params.repo_url.as_str()])
            .args(["--branch", params.branch.as_str()]);
        if params.depth > 0 {
            clone = clone.arg("--depth").arg(params.depth.to_string());
        }
        vec![clone]
    }
}
