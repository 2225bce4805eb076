//! Error types for target execution.
//!
//! Failures come in two flavours:
//! - [`BuildError`]: an expected, user-attributable build failure that carries
//!   enough context (task, build file, line) to print an actionable diagnostic.
//! - Unstructured errors: I/O failures, panics and anything else an action did
//!   not anticipate. These are reported with full detail only in debug mode.

use std::any::Any;
use std::backtrace::Backtrace;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A structured build failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error(
  "{}{}: {message}",
  .build_file.display(),
  .line.map(|l| format!(":{l}")).unwrap_or_default()
)]
pub struct BuildError {
  /// Human-readable cause.
  pub message: String,
  /// Name of the target that raised the error, if known.
  pub task: Option<String>,
  /// Build file in effect when the error was raised.
  pub build_file: PathBuf,
  /// Best-effort line in the build file of the raising site.
  pub line: Option<u32>,
}

impl BuildError {
  /// Create an error with only a message. Use the `with_*` builders to add context.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      task: None,
      build_file: PathBuf::new(),
      line: None,
    }
  }

  pub fn with_task(mut self, task: impl Into<String>) -> Self {
    self.task = Some(task.into());
    self
  }

  pub fn with_build_file(mut self, build_file: impl Into<PathBuf>) -> Self {
    self.build_file = build_file.into();
    self
  }

  pub fn with_line(mut self, line: Option<u32>) -> Self {
    self.line = line;
    self
  }

  /// The error raised when a target name does not resolve within a project.
  pub fn unknown_target(name: &str) -> Self {
    Self::new(format!("Unknown target '{}'", name))
  }
}

/// Errors returned by an [`Action`](crate::action::Action).
#[derive(Debug, Error)]
pub enum ActionError {
  /// An expected failure the action chose to report.
  #[error(transparent)]
  Build(#[from] BuildError),

  /// I/O error while performing the action.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Any other failure the action did not anticipate.
  #[error("{0}")]
  Unexpected(String),
}

impl ActionError {
  /// Returns true if this is a structured [`BuildError`].
  pub fn is_structured(&self) -> bool {
    matches!(self, ActionError::Build(_))
  }
}

/// Errors propagated from the invoker to the project runner.
#[derive(Debug, Error)]
pub enum RunError {
  /// A structured failure. Aborts the run and is reported with task, file and line.
  #[error(transparent)]
  Build(#[from] BuildError),

  /// An unstructured failure from an action or from the engine itself.
  #[error("{message}")]
  Unexpected {
    task: Option<String>,
    message: String,
    /// Rendered call stack, captured only when debug is enabled.
    stack: Option<String>,
  },
}

impl RunError {
  /// Wrap an unstructured failure, capturing the call stack when `debug` is set.
  pub fn unexpected(task: Option<&str>, message: impl Into<String>, debug: bool) -> Self {
    RunError::Unexpected {
      task: task.map(str::to_string),
      message: message.into(),
      stack: debug.then(|| Backtrace::force_capture().to_string()),
    }
  }

  /// Convert an action's error, keeping structured errors structured.
  pub fn from_action(task: &str, err: ActionError, debug: bool) -> Self {
    match err {
      ActionError::Build(e) => RunError::Build(e),
      other => RunError::unexpected(Some(task), other.to_string(), debug),
    }
  }

  /// Name of the target the error is attributed to.
  pub fn task(&self) -> Option<&str> {
    match self {
      RunError::Build(e) => e.task.as_deref(),
      RunError::Unexpected { task, .. } => task.as_deref(),
    }
  }

  pub fn is_structured(&self) -> bool {
    matches!(self, RunError::Build(_))
  }
}

impl Serialize for RunError {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    enum Repr<'a> {
      Build(&'a BuildError),
      Unexpected { task: Option<&'a str>, message: &'a str },
    }

    match self {
      RunError::Build(e) => Repr::Build(e).serialize(serializer),
      RunError::Unexpected { task, message, .. } => Repr::Unexpected {
        task: task.as_deref(),
        message,
      }
      .serialize(serializer),
    }
  }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
