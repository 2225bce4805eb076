//! Targets: named, dependency-aware units of work.

use std::fmt;
use std::sync::Arc;

use crate::action::{Action, ActionContext};
use crate::error::ActionError;

/// A named unit of work bound to one [`Action`].
///
/// `depends` lists the targets that must fully execute, in order, before this
/// target's own action runs. When `parallel` is set the action runs on its own
/// thread and the invoking call does not wait for it.
///
/// Targets are immutable once built. The action is shared (not cloned) with the
/// thread that runs it when the target is parallel.
pub struct Target {
  name: String,
  action: Arc<dyn Action>,
  depends: Vec<String>,
  parallel: bool,
  line: Option<u32>,
}

impl Target {
  pub fn new(name: impl Into<String>, action: impl Action + 'static) -> Self {
    Self::from_shared(name, Arc::new(action))
  }

  pub fn from_shared(name: impl Into<String>, action: Arc<dyn Action>) -> Self {
    Self {
      name: name.into(),
      action,
      depends: Vec::new(),
      parallel: false,
      line: None,
    }
  }

  /// A target with no work of its own, used to group dependencies.
  pub fn group(name: impl Into<String>) -> Self {
    Self::new(name, |_: &ActionContext| -> Result<(), ActionError> { Ok(()) })
  }

  pub fn depends_on<I, S>(mut self, depends: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.depends = depends.into_iter().map(Into::into).collect();
    self
  }

  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  /// Line in the build file where the target's work is declared.
  pub fn with_line(mut self, line: Option<u32>) -> Self {
    self.line = line;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn action(&self) -> &Arc<dyn Action> {
    &self.action
  }

  pub fn depends(&self) -> &[String] {
    &self.depends
  }

  pub fn is_parallel(&self) -> bool {
    self.parallel
  }

  pub fn line(&self) -> Option<u32> {
    self.line
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("depends", &self.depends)
      .field("parallel", &self.parallel)
      .field("line", &self.line)
      .finish_non_exhaustive()
  }
}
