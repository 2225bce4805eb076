//! Implementation of running targets, the default `mill` command.
//!
//! Loads the build file, runs the requested targets (or the default target)
//! once, and maps the outcome to the process exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use taskmill_lib::load::load_build_file;
use taskmill_lib::log::{ConsoleLogger, Stream};
use taskmill_lib::registry::ParallelStatus;
use taskmill_lib::{RunConfig, RunReport};

use super::locate_build_file;
use crate::output::{OutputFormat, format_duration, print_json, print_warning};

/// Options for a run, as given on the command line.
#[derive(Debug)]
pub struct RunArgs {
  pub file: PathBuf,
  pub targets: Vec<String>,
  pub debug: bool,
  pub join_timeout: Duration,
  pub shell: Option<String>,
  pub output: OutputFormat,
}

/// Execute the run command.
///
/// Progress lines go to stdout, or to stderr with `--format json` so that
/// stdout carries only the JSON report.
pub fn cmd_run(args: RunArgs) -> Result<ExitCode> {
  let Some(path) = locate_build_file(&args.file, args.output) else {
    return Ok(ExitCode::FAILURE);
  };

  let decl = load_build_file(&path).with_context(|| format!("Failed to load {}", path.display()))?;
  debug!(targets = decl.targets.len(), "loaded build declarations");

  let mut project = decl.into_project();

  let config = RunConfig::default()
    .with_build_file(path)
    .with_requested(args.targets)
    .with_debug(args.debug)
    .with_join_timeout(args.join_timeout)
    .with_shell(args.shell);

  let stream = if args.output.is_json() {
    Stream::Stderr
  } else {
    Stream::Stdout
  };
  let report = project.run(&config, Arc::new(ConsoleLogger::new(stream)));

  if args.output.is_json() {
    print_json(&report)?;
  } else {
    warn_parallel(&report, config.join_timeout);
  }

  Ok(if report.succeeded() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

/// Surface parallel targets that did not complete cleanly. They never change
/// the exit code.
fn warn_parallel(report: &RunReport, join_timeout: Duration) {
  for outcome in &report.parallel {
    match &outcome.status {
      ParallelStatus::Completed => {}
      ParallelStatus::Failed { message, .. } => {
        print_warning(&format!("parallel target '{}' failed: {}", outcome.target, message));
      }
      ParallelStatus::Panicked { message } => {
        print_warning(&format!("parallel target '{}' panicked: {}", outcome.target, message));
      }
      ParallelStatus::TimedOut => {
        print_warning(&format!(
          "parallel target '{}' still running after {}",
          outcome.target,
          format_duration(join_timeout)
        ));
      }
    }
  }
}
