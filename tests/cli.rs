//! End-to-end runs of the myrmex binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BUILD: &str = r#"
[project]
name = "demo"
default = "build"

[target.build]
description = "Builds it"
echo = ["compiling ${who}"]

[target.test]
description = "Runs tests"

[target.compile]
echo = ["compile ran"]
"#;

fn myrmex(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("myrmex").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn project_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("build.toml"), BUILD).unwrap();
    temp_dir
}

#[test]
fn test_version_banner() {
    let empty = TempDir::new().unwrap();
    myrmex(empty.path())
        .arg("-version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Myrmex version \S+ compiled on .+\n$").unwrap());
}

#[test]
fn test_help_prints_usage() {
    let empty = TempDir::new().unwrap();
    myrmex(empty.path())
        .arg("-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("-buildfile <file>"));
}

#[test]
fn test_property_and_target() {
    let dir = project_dir();
    myrmex(dir.path())
        .args(["-Dwho=everyone", "-Dwho=bar", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[echo] compiling bar"))
        .stdout(predicate::str::contains("BUILD SUCCESSFUL"));
}

#[test]
fn test_missing_build_file() {
    let empty = TempDir::new().unwrap();
    myrmex(empty.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("build.toml does not exist!"));
}

#[test]
fn test_find_from_nested_directory() {
    let dir = project_dir();
    let nested = dir.path().join("a").join("b").join("c");
    fs::create_dir_all(&nested).unwrap();

    myrmex(&nested)
        .args(["-find", "build.toml", "compile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Searching for build.toml ..."))
        .stdout(predicate::str::contains("[echo] compile ran"));
}

#[test]
fn test_find_treats_next_token_as_file_name() {
    let dir = project_dir();
    let nested = dir.path().join("deep");
    fs::create_dir_all(&nested).unwrap();

    myrmex(&nested)
        .args(["-find", "compile"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not locate a build file!"));
}

#[test]
fn test_project_help() {
    let dir = project_dir();
    myrmex(dir.path())
        .arg("-projecthelp")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Main targets:\n\n build  Builds it\n test   Runs tests\n",
        ))
        .stdout(predicate::str::contains("Default target: build"))
        .stdout(predicate::str::contains("[echo]").not())
        .stdout(predicate::str::contains("BUILD SUCCESSFUL").not());
}

#[test]
fn test_listener_as_logger_rejected() {
    let dir = project_dir();
    myrmex(dir.path())
        .args(["-logger", "JsonEventListener"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JsonEventListener"))
        .stdout(predicate::str::contains("BUILD").not());

    assert!(!dir.path().join("build-events.json").exists());
}

#[test]
fn test_json_listener_writes_events() {
    let dir = project_dir();
    myrmex(dir.path())
        .args(["-listener", "JsonEventListener", "-Dwho=json", "build"])
        .assert()
        .success();

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("build-events.json")).unwrap())
            .unwrap();
    assert_eq!(doc["success"], true);
    assert_eq!(doc["targets"][0]["name"], "build");
}

#[test]
fn test_failing_target_exits_one() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("build.toml"),
        "[target.broken]\nfail = \"it broke\"\n",
    )
    .unwrap();

    myrmex(dir.path())
        .arg("broken")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("BUILD FAILED"))
        .stderr(predicate::str::contains("it broke"));
}

#[test]
fn test_logfile_captures_output() {
    let dir = project_dir();
    myrmex(dir.path())
        .args(["-logfile", "run.log", "-Dwho=log", "build"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let log = fs::read_to_string(dir.path().join("run.log")).unwrap();
    assert!(log.contains("[echo] compiling log"));
    assert!(log.contains("BUILD SUCCESSFUL"));
}

#[test]
fn test_unknown_argument_prints_usage() {
    let dir = project_dir();
    myrmex(dir.path())
        .arg("-bogus")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown argument: -bogus"))
        .stdout(predicate::str::contains("myrmex [options]"));
}
