//! Projects and the run lifecycle.
//!
//! A [`Project`] owns its targets and the [`ThreadRegistry`] used for parallel
//! targets. [`Project::run`] selects the requested targets (or the default),
//! invokes them until the first failure, joins any parallel work, and reports
//! the outcome through the logger.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::error::{BuildError, RunError};
use crate::invoke::Invoker;
use crate::log::Logger;
use crate::registry::{ParallelOutcome, ThreadRegistry};
use crate::target::Target;

/// Lifecycle of a project run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
  Idle,
  Running,
  Succeeded,
  Failed,
}

/// Final status of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Succeeded,
  Failed,
}

impl From<RunStatus> for RunState {
  fn from(status: RunStatus) -> Self {
    match status {
      RunStatus::Succeeded => RunState::Succeeded,
      RunStatus::Failed => RunState::Failed,
    }
  }
}

/// What one call to [`Project::run`] produced.
#[derive(Debug, Serialize)]
pub struct RunReport {
  pub project: String,
  pub status: RunStatus,
  /// The error that aborted the run, if any.
  pub failure: Option<RunError>,
  #[serde(serialize_with = "serialize_secs")]
  pub elapsed: Duration,
  /// Outcomes of parallel targets observed during the join phase.
  ///
  /// These are informational only; they never change `status`.
  pub parallel: Vec<ParallelOutcome>,
}

impl RunReport {
  pub fn succeeded(&self) -> bool {
    self.status == RunStatus::Succeeded
  }
}

fn serialize_secs<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(elapsed.as_secs_f64())
}

/// A named set of targets with an optional default.
pub struct Project {
  name: String,
  default: Option<String>,
  targets: HashMap<String, Target>,
  registry: ThreadRegistry,
  state: RunState,
}

impl Project {
  /// Build a project from its targets. A later target with the same name
  /// replaces an earlier one.
  pub fn new<I>(name: impl Into<String>, default: Option<String>, targets: I) -> Self
  where
    I: IntoIterator<Item = Target>,
  {
    let mut map = HashMap::new();
    for target in targets {
      if let Some(previous) = map.insert(target.name().to_string(), target) {
        debug!(target = %previous.name(), "target redefined");
      }
    }

    Self {
      name: name.into(),
      default,
      targets: map,
      registry: ThreadRegistry::new(),
      state: RunState::Idle,
    }
  }

  /// Build a project and run it once straight away.
  pub fn start<I>(
    name: impl Into<String>,
    default: Option<String>,
    targets: I,
    config: &RunConfig,
    logger: Arc<dyn Logger>,
  ) -> (Self, RunReport)
  where
    I: IntoIterator<Item = Target>,
  {
    let mut project = Self::new(name, default, targets);
    let report = project.run(config, logger);
    (project, report)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn default_target(&self) -> Option<&str> {
    self.default.as_deref()
  }

  pub fn target(&self, name: &str) -> Option<&Target> {
    self.targets.get(name)
  }

  /// Names of all declared targets, sorted.
  pub fn target_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  pub fn state(&self) -> RunState {
    self.state
  }

  /// Run the requested targets, or the default target when none are requested.
  ///
  /// Stops at the first error. Parallel targets launched before that point are
  /// still joined, each for at most `config.join_timeout`. The outcome is
  /// reported through `logger` under the project's name.
  pub fn run(&mut self, config: &RunConfig, logger: Arc<dyn Logger>) -> RunReport {
    let start = Instant::now();
    self.state = RunState::Running;
    info!(project = %self.name, requested = ?config.requested, "starting run");

    let failure = self.run_targets(config, logger.clone()).err();

    if config.debug {
      for pending in self.registry.pending() {
        logger.log(&self.name, &format!("joining {}", pending));
      }
    }
    let parallel = self.registry.drain(config.join_timeout);

    let status = match failure {
      None => RunStatus::Succeeded,
      Some(_) => RunStatus::Failed,
    };
    self.state = status.into();

    let report = RunReport {
      project: self.name.clone(),
      status,
      failure,
      elapsed: start.elapsed(),
      parallel,
    };
    self.report(&report, config.debug, logger.as_ref());

    info!(project = %self.name, status = ?report.status, elapsed = ?report.elapsed, "run finished");
    report
  }

  fn run_targets(&mut self, config: &RunConfig, logger: Arc<dyn Logger>) -> Result<(), RunError> {
    let selected = match (config.requested.is_empty(), &self.default) {
      (false, _) => config.requested.clone(),
      (true, Some(default)) => vec![default.clone()],
      (true, None) => {
        return Err(BuildError::new("No default target").with_build_file(config.build_file.clone()).into());
      }
    };

    let mut invoker = Invoker::new(&self.targets, &mut self.registry, config, logger);
    for name in &selected {
      invoker.invoke_named(name)?;
    }

    Ok(())
  }

  fn report(&self, report: &RunReport, debug: bool, logger: &dyn Logger) {
    match &report.failure {
      None => logger.log(&self.name, "BUILD SUCCESSFUL"),
      Some(failure) => {
        logger.log(&self.name, "BUILD FAILED");
        logger.log(&self.name, &failure.to_string());
        if debug && let RunError::Unexpected { stack: Some(stack), .. } = failure {
          logger.log(&self.name, stack);
        }
      }
    }

    logger.log(&self.name, &format!("Total time: {} seconds", report.elapsed.as_secs()));
  }
}
