//! Running targets through the CLI.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn default_target_runs_dependency_first() {
  let env = TestEnv::from_fixture("basic.lua");

  let output = env.mill_cmd().assert().success().get_output().stdout.clone();
  let stdout = String::from_utf8(output).unwrap();

  let fetch = stdout.find("[fetch] fetching sources").expect("fetch ran");
  let compile = stdout.find("[compile] compiling compile").expect("compile ran");
  assert!(fetch < compile);
  assert!(!stdout.contains("writing docs"));
  assert!(stdout.contains("[demo] BUILD SUCCESSFUL"));
  assert!(stdout.contains("[demo] Total time: "));
}

#[test]
fn prints_build_file_path() {
  let env = TestEnv::from_fixture("basic.lua");
  let canonical = dunce::canonicalize(&env.build_file).unwrap();

  env
    .mill_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("Buildfile: {}", canonical.display())));
}

#[test]
fn requested_targets_run_in_order() {
  let env = TestEnv::from_fixture("diamond.lua");

  let output = env.mill_cmd().args(["a", "b"]).assert().success().get_output().stdout.clone();
  let stdout = String::from_utf8(output).unwrap();

  // The shared dependency runs once per path.
  assert_eq!(stdout.matches("[c] c ran").count(), 2);
  assert!(stdout.find("[a] a ran").unwrap() < stdout.find("[b] b ran").unwrap());
}

#[test]
fn missing_build_file_exits_with_failure() {
  let env = TestEnv::empty();

  env
    .mill_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Buildfile: build.lua not found!"));
}

#[test]
fn explicit_build_file_flag() {
  let env = TestEnv::empty();
  env.write_file("sub/project.lua", &super::common::fixture_content("basic.lua"));

  env
    .mill_cmd()
    .args(["-f", "sub/project.lua", "fetch"])
    .assert()
    .success()
    .stdout(predicate::str::contains("[fetch] fetching sources"))
    .stdout(predicate::str::contains("compiling").not());
}

#[test]
fn unknown_target_fails() {
  let env = TestEnv::from_fixture("basic.lua");

  env
    .mill_cmd()
    .arg("nope")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("BUILD FAILED"))
    .stdout(predicate::str::contains("Unknown target 'nope'"));
}

#[test]
fn unknown_dependency_fails_without_running_target() {
  let env = TestEnv::from_fixture("missing_dep.lua");

  env
    .mill_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Unknown target 'missing'"))
    .stdout(predicate::str::contains("x should never run").not());
}

#[test]
fn missing_default_fails() {
  let env = TestEnv::from_fixture("no_default.lua");

  env
    .mill_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("No default target"));

  env
    .mill_cmd()
    .arg("only")
    .assert()
    .success()
    .stdout(predicate::str::contains("[only] only ran"));
}

#[test]
fn structured_failure_reports_file_and_line() {
  let env = TestEnv::from_fixture("fail_step.lua");
  let canonical = dunce::canonicalize(&env.build_file).unwrap();

  env
    .mill_cmd()
    .assert()
    .code(1)
    .stdout(predicate::str::contains("BUILD FAILED"))
    .stdout(predicate::str::contains(format!(
      "{}:5: Specified source does not exist",
      canonical.display()
    )));
}

#[test]
fn parallel_failure_does_not_fail_the_build() {
  let env = TestEnv::from_fixture("parallel_fail.lua");

  env
    .mill_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("[p] running in parallel"))
    .stdout(predicate::str::contains("BUILD SUCCESSFUL"))
    .stderr(predicate::str::contains("parallel target 'p' failed"));
}

#[test]
fn file_steps_resolve_against_build_file_directory() {
  let env = TestEnv::from_fixture("files.lua");
  env.write_file("src/keep.txt", "keep");
  env.write_file("src/skip.bin", "skip");
  env.write_file("stale/old.txt", "old");

  env.mill_cmd().assert().success();

  assert!(env.path("out/keep.txt").exists());
  assert!(!env.path("out/skip.bin").exists());
  assert!(!env.path("stale").exists());
}

#[test]
fn cmd_output_is_logged() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("cmd.lua");

  env
    .mill_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("[hello] hello from shell"))
    .stdout(predicate::str::contains("[hello] hi there"));
}

#[test]
fn json_report_on_stdout() {
  let env = TestEnv::from_fixture("parallel_fail.lua");

  let output = env
    .mill_cmd()
    .args(["--format", "json"])
    .assert()
    .success()
    .get_output()
    .clone();

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["project"], "bg");
  assert_eq!(report["status"], "succeeded");
  assert_eq!(report["parallel"][0]["target"], "p");
  assert_eq!(report["parallel"][0]["status"], "failed");

  let stderr = String::from_utf8(output.stderr).unwrap();
  assert!(stderr.contains("Buildfile: "));
  assert!(stderr.contains("[bg] BUILD SUCCESSFUL"));
}

#[test]
fn json_report_for_failure() {
  let env = TestEnv::from_fixture("missing_dep.lua");

  let output = env
    .mill_cmd()
    .args(["--format", "json"])
    .assert()
    .code(1)
    .get_output()
    .stdout
    .clone();

  let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(report["status"], "failed");
  assert_eq!(report["failure"]["kind"], "build");
  assert_eq!(report["failure"]["task"], "x");
}

#[test]
fn debug_logs_thread_launch_and_join() {
  let env = TestEnv::from_fixture("basic.lua");

  env
    .mill_cmd()
    .args(["-d", "docs"])
    .assert()
    .success()
    .stdout(predicate::str::contains("[docs] started thread"))
    .stdout(predicate::str::contains("[demo] joining docs"));
}

#[test]
fn lua_error_is_reported() {
  let env = TestEnv::from_fixture("syntax_error.lua");

  env
    .mill_cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Failed to load"));
}
