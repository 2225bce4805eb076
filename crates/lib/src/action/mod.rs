//! The Action contract and built-in steps.
//!
//! An [`Action`] is a single unit of work bound to a target. It takes no
//! arguments beyond its [`ActionContext`] and either succeeds or returns an
//! [`ActionError`]. Any closure of the right shape is an action, which is how
//! library users and tests plug in their own work.
//!
//! Build files declare their work as a list of [`Step`]s (shell commands, file
//! operations, messages). [`Steps`] runs such a list in order and is itself an
//! action.
//!
//! # Step Types
//!
//! - [`Step::Cmd`] - Run a shell command with optional env and cwd
//! - [`Step::Echo`] - Log a message
//! - [`Step::Mkdir`], [`Step::Copy`], [`Step::Delete`] - File operations
//! - [`Step::Sleep`] - Pause the executing thread
//! - [`Step::Fail`] - Raise a structured build error

pub mod actions;
mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{ActionError, BuildError};
use crate::log::Logger;

/// A zero-argument unit of work.
pub trait Action: Send + Sync {
  fn execute(&self, ctx: &ActionContext) -> Result<(), ActionError>;
}

impl<F> Action for F
where
  F: Fn(&ActionContext) -> Result<(), ActionError> + Send + Sync,
{
  fn execute(&self, ctx: &ActionContext) -> Result<(), ActionError> {
    self(ctx)
  }
}

/// Everything an action may need while it runs.
///
/// Cloned into parallel threads, so it only holds owned or shared data.
#[derive(Clone)]
pub struct ActionContext {
  task: String,
  build_file: PathBuf,
  line: Option<u32>,
  base_dir: PathBuf,
  shell: Option<String>,
  logger: Arc<dyn Logger>,
}

impl ActionContext {
  pub fn new(task: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
    Self {
      task: task.into(),
      build_file: PathBuf::new(),
      line: None,
      base_dir: PathBuf::from("."),
      shell: None,
      logger,
    }
  }

  pub fn with_build_file(mut self, build_file: impl Into<PathBuf>) -> Self {
    self.build_file = build_file.into();
    self
  }

  pub fn with_line(mut self, line: Option<u32>) -> Self {
    self.line = line;
    self
  }

  pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
    self.base_dir = base_dir.into();
    self
  }

  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }

  /// Name of the target being executed.
  pub fn task(&self) -> &str {
    &self.task
  }

  pub fn build_file(&self) -> &Path {
    &self.build_file
  }

  pub fn line(&self) -> Option<u32> {
    self.line
  }

  /// Directory relative paths are resolved against (the build file's directory).
  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  pub fn shell(&self) -> Option<&str> {
    self.shell.as_deref()
  }

  /// Report progress for this task.
  pub fn log(&self, message: &str) {
    self.logger.log(&self.task, message);
  }

  /// Build a structured error attributed to this task, file and line.
  pub fn fail(&self, message: impl Into<String>) -> ActionError {
    ActionError::Build(
      BuildError::new(message)
        .with_task(self.task.clone())
        .with_build_file(self.build_file.clone())
        .with_line(self.line),
    )
  }

  /// Resolve `path` against the base directory unless it is absolute.
  pub fn resolve(&self, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }
}

/// An ordered list of declared steps, executed one after another.
///
/// The first failing step stops the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Steps(pub Vec<Step>);

impl Steps {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Action for Steps {
  fn execute(&self, ctx: &ActionContext) -> Result<(), ActionError> {
    for (index, step) in self.0.iter().enumerate() {
      debug!(task = %ctx.task(), index, step = step.kind(), "executing step");
      execute_step(step, ctx)?;
    }
    Ok(())
  }
}

/// Execute a single step.
///
/// This dispatches to the appropriate handler based on the step type.
pub fn execute_step(step: &Step, ctx: &ActionContext) -> Result<(), ActionError> {
  match step {
    Step::Cmd(opts) => actions::cmd::execute_cmd(opts, ctx),
    Step::Echo { message } => {
      ctx.log(message);
      Ok(())
    }
    Step::Mkdir { path } => actions::fs::make_dir(path, ctx),
    Step::Copy(opts) => actions::fs::copy(opts, ctx),
    Step::Delete { path } => actions::fs::delete(path, ctx),
    Step::Sleep { ms } => {
      std::thread::sleep(Duration::from_millis(*ms));
      Ok(())
    }
    Step::Fail { message } => {
      ctx.log(message);
      Err(ctx.fail(message.clone()))
    }
  }
}
