//! Behaviour-driven tests for plugin validation and invocation.

use std::path::PathBuf;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::error::PluginError;
use crate::handle::PluginHandle;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    title: String,
    tags: Vec<String>,
}

fn input_document() -> Document {
    Document {
        title: String::from("release notes"),
        tags: vec![String::from("docs"), String::from("v1")],
    }
}

#[derive(Default)]
struct TestWorld {
    scratch: Option<TempDir>,
    path: Option<PathBuf>,
    handle: Option<PluginHandle>,
    validation: Option<Result<(), PluginError>>,
    invocation: Option<Result<(), PluginError>>,
    output: Option<Document>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scratch_dir(world: &mut TestWorld) -> PathBuf {
    world
        .scratch
        .get_or_insert_with(|| TempDir::new().expect("temp dir"))
        .path()
        .to_path_buf()
}

fn handle(world: &mut TestWorld) -> &mut PluginHandle {
    world.handle.as_mut().expect("no plugin handle loaded")
}

fn assert_kind(result: Option<&Result<(), PluginError>>, kind: &str) {
    let err = result
        .expect("no result captured")
        .as_ref()
        .expect_err("expected error but got success");
    let expected = kind.trim_matches('"');
    assert_eq!(err.kind().to_string(), expected, "unexpected error: {err}");
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a missing plugin path")]
fn given_missing_path(world: &mut TestWorld) {
    let path = scratch_dir(world).join("absent-plugin");
    world.path = Some(path);
}

#[given("a directory as the plugin path")]
fn given_directory_path(world: &mut TestWorld) {
    let path = scratch_dir(world);
    world.path = Some(path);
}

#[given("the shell plugin")]
fn given_shell_plugin(world: &mut TestWorld) {
    world.handle = Some(PluginHandle::load("/bin/sh").expect("load /bin/sh"));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the plugin is validated")]
fn when_validated(world: &mut TestWorld) {
    let path = world.path.clone().expect("no plugin path chosen");
    match PluginHandle::load(path) {
        Ok(loaded) => {
            world.handle = Some(loaded);
            world.validation = Some(Ok(()));
        }
        Err(err) => world.validation = Some(Err(err)),
    }
}

#[when("the plugin runs the script {script}")]
fn when_runs_script(world: &mut TestWorld, script: String) {
    let body = script.trim_matches('"').to_owned();
    let mut output = world.output.take();
    let result = handle(world).invoke(&input_document(), &mut output, &["-c", body.as_str()]);
    world.output = output;
    world.invocation = Some(result);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("validation fails with {kind}")]
fn then_validation_fails(world: &mut TestWorld, kind: String) {
    assert_kind(world.validation.as_ref(), &kind);
    assert!(world.handle.is_none(), "no handle should be bound");
}

#[then("the invocation succeeds")]
fn then_invocation_succeeds(world: &mut TestWorld) {
    let result = world.invocation.as_ref().expect("no invocation captured");
    assert!(result.is_ok(), "expected success, got {result:?}");
}

#[then("the invocation fails with {kind}")]
fn then_invocation_fails(world: &mut TestWorld, kind: String) {
    assert_kind(world.invocation.as_ref(), &kind);
}

#[then("the output equals the input")]
fn then_output_equals_input(world: &mut TestWorld) {
    assert_eq!(world.output, Some(input_document()));
}

#[then("the plugin wrote nothing to stderr")]
fn then_error_output_empty(world: &mut TestWorld) {
    assert_eq!(handle(world).error_output(), "");
}

#[then("the error output is {text}")]
fn then_error_output_is(world: &mut TestWorld, text: String) {
    let expected = text.trim_matches('"');
    assert_eq!(handle(world).error_output().trim_end(), expected);
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/plugin_invocation.feature", index = 0)]
fn missing_plugin_behaviour(world: TestWorld) {
    drop(world);
}

#[scenario(path = "tests/features/plugin_invocation.feature", index = 1)]
fn directory_plugin_behaviour(world: TestWorld) {
    drop(world);
}

#[cfg(unix)]
#[scenario(path = "tests/features/plugin_invocation.feature", index = 2)]
fn round_trip_behaviour(world: TestWorld) {
    drop(world);
}

#[cfg(unix)]
#[scenario(path = "tests/features/plugin_invocation.feature", index = 3)]
fn failing_exit_behaviour(world: TestWorld) {
    drop(world);
}

#[cfg(unix)]
#[scenario(path = "tests/features/plugin_invocation.feature", index = 4)]
fn malformed_output_behaviour(world: TestWorld) {
    drop(world);
}

#[cfg(unix)]
#[scenario(path = "tests/features/plugin_invocation.feature", index = 5)]
fn repeated_invocation_behaviour(world: TestWorld) {
    drop(world);
}
