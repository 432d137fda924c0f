//! `image build`: build and push a container image.

use konflux_task_core::{ParamBindings, ParamDescriptor};
use serde::Serialize;

use super::{Invocation, TaskCommand};
use crate::error::{CliError, Result};

static DESCRIPTORS: [ParamDescriptor; 6] = [
    ParamDescriptor::string("image")
        .with_short('i')
        .with_env("IMAGE")
        .with_usage("Image to produce")
        .required(),
    ParamDescriptor::string("source-dir")
        .with_short('s')
        .with_env("SOURCE_DIR")
        .with_usage("Path to source directory")
        .required(),
    ParamDescriptor::string("dockerfile")
        .with_short('d')
        .with_env("DOCKERFILE")
        .with_usage("Path to Dockerfile"),
    ParamDescriptor::string_array("labels")
        .with_short('l')
        .with_env("LABELS")
        .with_usage("Labels to add to the image"),
    ParamDescriptor::string_array("annotations")
        .with_short('a')
        .with_env("ANNOTATIONS")
        .with_usage("Annotations to add to the image"),
    ParamDescriptor::boolean("verbose")
        .with_short('v')
        .with_env("VERBOSE")
        .with_default("false")
        .with_usage("Activates verbose mode"),
];

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageBuildParams {
    pub image: String,
    pub dockerfile_path: String,
    pub source_dir: String,
    pub labels: Vec<String>,
    pub annotations: Vec<String>,
    pub verbose: bool,
}

pub struct ImageBuild;

impl TaskCommand for ImageBuild {
    const NAME: &'static str = "build";
    const ABOUT: &'static str = "Build a container image";

    type Params = ImageBuildParams;

    fn descriptors() -> &'static [ParamDescriptor] {
        &DESCRIPTORS
    }

    fn bindings() -> ParamBindings<ImageBuildParams> {
        ParamBindings::<Self::Params>::new()
            .string("image", |p, v| p.image = v)
            .string("dockerfile", |p, v| p.dockerfile_path = v)
            .string("source-dir", |p, v| p.source_dir = v)
            .string_array("labels", |p, v| p.labels = v)
            .string_array("annotations", |p, v| p.annotations = v)
            .boolean("verbose", |p, v| p.verbose = v)
    }

    fn verbose(params: &ImageBuildParams) -> bool {
        params.verbose
    }

    fn validate(params: &ImageBuildParams) -> Result<()> {
        check_key_values("label", &params.labels)?;
        check_key_values("annotation", &params.annotations)
    }

    fn plan(params: &ImageBuildParams) -> Vec<Invocation> {
        let mut build = Invocation::new("buildah").args(["build", "--no-cache"]);
        if !params.dockerfile_path.is_empty() {
            build = build.arg("-f").arg(&params.dockerfile_path);
        }
        for label in &params.labels {
            build = build.arg("--label").arg(label);
        }
        for annotation in &params.annotations {
            build = build.arg("--annotation").arg(annotation);
        }
        build = build
            .arg("-t")
            .arg(&params.image)
            .arg(&params.source_dir);

        let push = Invocation::new("buildah").args(["push", params.image.as_str()]);
        vec![build, push]
    }
}

/// Every entry must look like `key=value` with a non-empty key.
fn check_key_values(what: &str, entries: &[String]) -> Result<()> {
    match entries
        .iter()
        .find(|entry| !matches!(entry.split_once('='), Some((key, _)) if !key.is_empty()))
    {
        Some(bad) => Err(CliError::InvalidParams(format!(
            "{what} '{bad}' must have the form key=value"
        ))),
        None => Ok(()),
    }
}
