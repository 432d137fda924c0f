//! `image apply-tags`: push additional tags for an image digest.

use std::sync::LazyLock;

use konflux_task_core::{ParamBindings, ParamDescriptor};
use regex::Regex;
use serde::Serialize;

use super::{Invocation, TaskCommand};
use crate::error::{CliError, Result};

static DIGEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").expect("static regex must compile"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9._-]{0,127}$").expect("static regex must compile")
});

const COPY_RETRY_TIMES: u32 = 3;

static DESCRIPTORS: [ParamDescriptor; 4] = [
    ParamDescriptor::string("image-url")
        .with_short('i')
        .with_env("IMAGE_URL")
        .with_usage("Image URL to add tags to")
        .required(),
    ParamDescriptor::string("digest")
        .with_short('d')
        .with_env("IMAGE_DIGEST")
        .with_usage("Image digest to add tags to")
        .required(),
    ParamDescriptor::string_array("tags")
        .with_short('t')
        .with_env("TAGS")
        .with_usage("Tags to add to the given image"),
    ParamDescriptor::boolean("verbose")
        .with_short('v')
        .with_env("VERBOSE")
        .with_default("false")
        .with_usage("Activates verbose mode"),
];

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyTagsParams {
    pub image_url: String,
    pub digest: String,
    pub new_tags: Vec<String>,
    pub verbose: bool,
}

pub struct ApplyTags;

impl TaskCommand for ApplyTags {
    const NAME: &'static str = "apply-tags";
    const ABOUT: &'static str = "Creates more tags for provided image";

    type Params = ApplyTagsParams;

    fn descriptors() -> &'static [ParamDescriptor] {
        &DESCRIPTORS
    }

    fn bindings() -> ParamBindings<ApplyTagsParams> {
        ParamBindings::<Self::Params>::new()
            .string("image-url", |p, v| p.image_url = v)
            .string("digest", |p, v| p.digest = v)
            .string_array("tags", |p, v| p.new_tags = v)
            .boolean("verbose", |p, v| p.verbose = v)
    }

    fn verbose(params: &ApplyTagsParams) -> bool {
        params.verbose
    }

    fn validate(params: &ApplyTagsParams) -> Result<()> {
        if !DIGEST_RE.is_match(&params.digest) {
            return Err(CliError::InvalidParams(format!(
                "image digest '{}' is invalid",
                params.digest
            )));
        }
        if let Some(tag) = params.new_tags.iter().find(|tag| !TAG_RE.is_match(tag)) {
            return Err(CliError::InvalidParams(format!("tag '{tag}' is not valid")));
        }
        Ok(())
    }

    fn plan(params: &ApplyTagsParams) -> Vec<Invocation> {
        let repository = strip_tag(&params.image_url);
        let source = format!("docker://{repository}@{}", params.digest);

        params
            .new_tags
            .iter()
            .map(|tag| {
                Invocation::new("skopeo")
                    .args(["copy", "--multi-arch", "index-only", "--retry-times"])
                    .arg(COPY_RETRY_TIMES.to_string())
                    .arg(source.as_str())
                    .arg(format!("docker://{repository}:{tag}"))
            })
            .collect()
    }
}

/// Removes a trailing `:tag` and/or `@digest` from an image reference.
///
/// A `:` before the last `/` belongs to a registry port and is kept.
fn strip_tag(image_url: &str) -> &str {
    let image = image_url
        .split_once('@')
        .map_or(image_url, |(name, _)| name);
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => &image[..name_start + i],
        None => image,
    }
}
