//! Process-wide run configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default build file looked up when none is given.
pub const DEFAULT_BUILD_FILE: &str = "build.lua";

/// How long the join phase waits for each parallel target.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a run.
///
/// Set once before the engine runs and read-only thereafter.
#[derive(Debug, Clone)]
pub struct RunConfig {
  /// Emit extra diagnostics and capture call stacks for unstructured errors.
  pub debug: bool,

  /// Targets to run, in order. Empty means the project's default target.
  pub requested: Vec<String>,

  /// Path of the build declarations in effect.
  pub build_file: PathBuf,

  /// Bounded wait applied to each parallel target during the join phase.
  pub join_timeout: Duration,

  /// Shell used for `cmd` steps.
  /// If None, uses /bin/sh (Unix) or powershell.exe (Windows).
  pub shell: Option<String>,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      debug: false,
      requested: Vec::new(),
      build_file: PathBuf::from(DEFAULT_BUILD_FILE),
      join_timeout: DEFAULT_JOIN_TIMEOUT,
      shell: None,
    }
  }
}

impl RunConfig {
  pub fn with_requested<I, S>(mut self, targets: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.requested = targets.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  pub fn with_build_file(mut self, build_file: impl Into<PathBuf>) -> Self {
    self.build_file = build_file.into();
    self
  }

  pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
    self.join_timeout = timeout;
    self
  }

  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }
}
