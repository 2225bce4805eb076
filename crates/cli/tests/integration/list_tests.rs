//! Listing targets through the CLI.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn list_shows_project_default_and_targets() {
  let env = TestEnv::from_fixture("basic.lua");

  env
    .mill_cmd()
    .arg("--list")
    .assert()
    .success()
    .stdout(predicate::str::contains("Project: demo"))
    .stdout(predicate::str::contains("Default: compile"))
    .stdout(predicate::str::contains("compile → fetch"))
    .stdout(predicate::str::contains("docs (parallel)"))
    .stdout(predicate::str::contains("3 target(s) total"))
    .stdout(predicate::str::contains("fetching sources").not());
}

#[test]
fn list_json() {
  let env = TestEnv::from_fixture("diamond.lua");

  let output = env
    .mill_cmd()
    .args(["--list", "--format", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let list: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(list["project"], "diamond");
  assert!(list["default"].is_null());

  let names: Vec<&str> = list["targets"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["a", "b", "c"]);
  assert_eq!(list["targets"][0]["depends"][0], "c");
}

#[test]
fn list_missing_build_file() {
  let env = TestEnv::empty();

  env
    .mill_cmd()
    .arg("--list")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("not found!"));
}

#[test]
fn list_matches_the_runnable_project() {
  let env = TestEnv::empty();
  env.write_file(
    "build.lua",
    r#"
mill.project { name = "redefined" }
mill.target { name = "zeta" }
mill.target { name = "alpha", apply = function(ctx) ctx:echo("old") end }
mill.target {
  name = "alpha",
  depends = { "zeta" },
  apply = function(ctx)
    ctx:echo("one")
    ctx:echo("two")
  end,
}
"#,
  );

  let output = env
    .mill_cmd()
    .args(["--list", "--format", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let list: serde_json::Value = serde_json::from_slice(&output).unwrap();
  let targets = list["targets"].as_array().unwrap();
  assert_eq!(targets.len(), 2);
  assert_eq!(targets[0]["name"], "alpha");
  assert_eq!(targets[0]["depends"][0], "zeta");
  assert_eq!(targets[0]["steps"], 2);
  assert_eq!(targets[1]["name"], "zeta");
  assert_eq!(targets[1]["steps"], 0);
}
