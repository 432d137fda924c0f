use std::process::{Command, Output};

use serde_json::Value;

const DIGEST: &str = "sha256:0acffdabda074fb9ab4b9fc38c049db903d2199b0a8be64ee0f1ca5a4fb74667";

/// Environment variables read by any subcommand; cleared for every run.
const PARAM_ENV_VARS: &[&str] = &[
    "GIT_REPO_URL",
    "GIT_BRANCH",
    "VERBOSE",
    "IMAGE",
    "SOURCE_DIR",
    "DOCKERFILE",
    "LABELS",
    "ANNOTATIONS",
    "IMAGE_URL",
    "IMAGE_DIGEST",
    "TAGS",
    "RUST_LOG",
];

/// Runs the binary with `args` and only the given parameter variables set.
fn run(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_konflux-task-cli"));
    for var in PARAM_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.envs(env.iter().copied())
        .args(args)
        .output()
        .expect("failed to run konflux-task-cli")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn apply_tags_env() -> [(&'static str, &'static str); 2] {
    [("IMAGE_URL", "quay.io/org/app:build-1"), ("IMAGE_DIGEST", DIGEST)]
}

// ---------------------------------------------------------------------------
// Array arguments
// ---------------------------------------------------------------------------

#[test]
fn apply_tags_accepts_space_separated_tags() {
    let out = run(
        &["image", "apply-tags", "--tags", "v1", "v2", "latest"],
        &apply_tags_env(),
    );
    let json = stdout_json(&out);

    assert_eq!(json["command"], "image apply-tags");
    assert_eq!(
        json["params"]["new_tags"],
        serde_json::json!(["v1", "v2", "latest"])
    );
    let invocations = json["invocations"].as_array().unwrap();
    assert_eq!(invocations.len(), 3);
    assert_eq!(invocations[0]["program"], "skopeo");
    assert_eq!(
        invocations[2]["args"].as_array().unwrap().last().unwrap(),
        "docker://quay.io/org/app:latest"
    );
}

#[test]
fn apply_tags_equals_form_matches_space_form() {
    let spaced = stdout_json(&run(
        &["image", "apply-tags", "-t", "a", "b", "c"],
        &apply_tags_env(),
    ));
    let joined = stdout_json(&run(
        &["image", "apply-tags", "--tags=a,b,c"],
        &apply_tags_env(),
    ));
    assert_eq!(spaced["params"], joined["params"]);
}

#[test]
fn apply_tags_empty_array_flag_is_ignored() {
    let out = run(&["image", "apply-tags", "--tags", "-v"], &apply_tags_env());
    let json = stdout_json(&out);

    assert_eq!(json["params"]["new_tags"], serde_json::json!([]));
    assert_eq!(json["params"]["verbose"], true);
    assert_eq!(json["invocations"], serde_json::json!([]));
}

#[test]
fn apply_tags_reads_tags_from_env() {
    let mut env = apply_tags_env().to_vec();
    env.push(("TAGS", "x,,y"));
    let json = stdout_json(&run(&["image", "apply-tags"], &env));
    assert_eq!(json["params"]["new_tags"], serde_json::json!(["x", "y"]));
}

#[test]
fn image_build_expands_labels_and_annotations() {
    let out = run(
        &[
            "image",
            "build",
            "-i",
            "quay.io/org/app:v1",
            "--labels",
            "a=1",
            "b=2",
            "-a",
            "c=3",
            "--source-dir",
            "/src",
        ],
        &[],
    );
    let json = stdout_json(&out);

    assert_eq!(json["params"]["labels"], serde_json::json!(["a=1", "b=2"]));
    assert_eq!(json["params"]["annotations"], serde_json::json!(["c=3"]));
    assert_eq!(json["params"]["source_dir"], "/src");
}

#[test]
fn image_build_accepts_dash_leading_equals_value() {
    let out = run(
        &["image", "build", "-i", "x", "-s", "/s", "--annotations=-k=v", "-l=a=1,-b=2"],
        &[],
    );
    let json = stdout_json(&out);

    assert_eq!(json["params"]["annotations"], serde_json::json!(["-k=v"]));
    assert_eq!(json["params"]["labels"], serde_json::json!(["a=1", "-b=2"]));
}

// ---------------------------------------------------------------------------
// Precedence and errors
// ---------------------------------------------------------------------------

#[test]
fn gitclone_flag_overrides_env_overrides_default() {
    let url = ("GIT_REPO_URL", "https://github.com/org/repo.git");

    let flag = stdout_json(&run(
        &["gitclone", "--branch", "feature"],
        &[url, ("GIT_BRANCH", "devel")],
    ));
    assert_eq!(flag["params"]["branch"], "feature");

    let env = stdout_json(&run(&["gitclone"], &[url, ("GIT_BRANCH", "devel")]));
    assert_eq!(env["params"]["branch"], "devel");

    let default = stdout_json(&run(&["gitclone"], &[url]));
    assert_eq!(default["params"]["branch"], "main");
    assert_eq!(
        default["invocations"][0]["args"],
        serde_json::json!(["clone", "https://github.com/org/repo.git", "--branch", "main"])
    );
}

#[test]
fn gitclone_missing_required_url_fails() {
    let out = run(&["gitclone"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr(&out).contains("required parameter 'url' is not set"),
        "unexpected stderr: {}",
        stderr(&out)
    );
    assert!(out.stdout.is_empty());
}

#[test]
fn gitclone_invalid_depth_names_parameter_and_value() {
    let out = run(&["gitclone", "--url", "https://x/repo.git", "--depth", "abc"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("invalid value 'abc' for parameter 'depth'"));
}

#[test]
fn gitclone_rejects_non_https_url() {
    let out = run(&["gitclone"], &[("GIT_REPO_URL", "git@github.com:org/repo.git")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("only https protocol is supported"));
}

#[test]
fn apply_tags_rejects_invalid_digest() {
    let out = run(
        &["image", "apply-tags", "--digest", "sha256:nope", "--tags", "v1"],
        &[("IMAGE_URL", "quay.io/org/app")],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("image digest 'sha256:nope' is invalid"));
}

#[test]
fn verbose_env_logs_params() {
    let out = run(
        &["gitclone", "--depth", "1"],
        &[("GIT_REPO_URL", "https://x/repo.git"), ("VERBOSE", "true")],
    );
    let json = stdout_json(&out);
    assert_eq!(json["params"]["verbose"], true);
    assert_eq!(json["params"]["depth"], 1);

    let logs = stderr(&out);
    assert!(logs.contains("[param] repo_url: https://x/repo.git"), "logs: {logs}");
    assert!(logs.contains("[param] depth: 1"), "logs: {logs}");
}

#[test]
fn verbose_flag_false_overrides_env() {
    let out = run(
        &["gitclone", "--verbose=false"],
        &[("GIT_REPO_URL", "https://x/repo.git"), ("VERBOSE", "true")],
    );
    assert_eq!(stdout_json(&out)["params"]["verbose"], false);
}

#[test]
fn help_shows_env_aliases() {
    let out = run(&["image", "apply-tags", "--help"], &[]);
    assert!(out.status.success());
    let help = String::from_utf8_lossy(&out.stdout);
    assert!(help.contains("--tags"), "help: {help}");
    assert!(help.contains("IMAGE_DIGEST"), "help: {help}");
}

#[test]
fn missing_subcommand_is_usage_error() {
    let out = run(&["image"], &[]);
    assert!(!out.status.success());
}
