use std::collections::BTreeMap;

use serde::Serialize;

/// A declared unit of work inside a target.
///
/// Steps are recorded while a build file is loaded (see [`StepRecorder`]) and
/// executed later, possibly on another thread, by [`Steps`](super::Steps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
  /// Run a shell command.
  Cmd(CmdOpts),
  /// Log a message.
  Echo { message: String },
  /// Create a directory and any missing parents.
  Mkdir { path: String },
  /// Copy a file or a filtered directory tree.
  Copy(CopyOpts),
  /// Remove a file or directory tree.
  Delete { path: String },
  /// Pause the executing thread.
  Sleep { ms: u64 },
  /// Raise a structured build error.
  Fail { message: String },
}

impl Step {
  /// Short name of the step type, as used in build files.
  pub fn kind(&self) -> &'static str {
    match self {
      Step::Cmd(_) => "cmd",
      Step::Echo { .. } => "echo",
      Step::Mkdir { .. } => "mkdir",
      Step::Copy(_) => "copy",
      Step::Delete { .. } => "delete",
      Step::Sleep { .. } => "sleep",
      Step::Fail { .. } => "fail",
    }
  }
}

/// Options for a [`Step::Cmd`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdOpts {
  pub cmd: String,
  pub env: Option<BTreeMap<String, String>>,
  pub cwd: Option<String>,
}

impl CmdOpts {
  pub fn new(cmd: &str) -> Self {
    Self {
      cmd: cmd.to_string(),
      env: None,
      cwd: None,
    }
  }

  pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
    self.env = Some(env);
    self
  }

  pub fn with_cwd(mut self, cwd: &str) -> Self {
    self.cwd = Some(cwd.to_string());
    self
  }
}

impl From<&str> for CmdOpts {
  fn from(cmd: &str) -> Self {
    CmdOpts::new(cmd)
  }
}

/// Options for a [`Step::Copy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOpts {
  pub from: String,
  pub to: String,
  /// Regex patterns; a file is copied if it matches any of them.
  pub include: Vec<String>,
  /// Regex patterns; a file is skipped if it matches any of them.
  pub exclude: Vec<String>,
}

impl CopyOpts {
  pub fn new(from: &str, to: &str) -> Self {
    Self {
      from: from.to_string(),
      to: to.to_string(),
      include: Vec::new(),
      exclude: Vec::new(),
    }
  }
}

/// Collects the steps of one target while its `apply` function runs.
///
/// # Example (Lua)
///
/// ```lua
/// mill.target {
///     name = "dist",
///     depends = { "compile" },
///     apply = function(ctx)
///         ctx:mkdir("dist")
///         ctx:copy { from = "target/release", to = "dist", include = { "\\.so$" } }
///         ctx:cmd("tar czf dist.tar.gz dist")
///     end,
/// }
/// ```
pub struct StepRecorder {
  name: String,
  steps: Vec<Step>,
}

impl StepRecorder {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      steps: Vec::new(),
    }
  }

  /// Name of the target whose steps are being recorded.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn record(&mut self, step: Step) {
    self.steps.push(step);
  }

  pub fn cmd(&mut self, opts: impl Into<CmdOpts>) {
    self.record(Step::Cmd(opts.into()));
  }

  /// Returns the number of steps recorded so far.
  pub fn step_count(&self) -> usize {
    self.steps.len()
  }

  /// Consume the recorder and return the recorded steps.
  pub fn into_steps(self) -> Vec<Step> {
    self.steps
  }
}
