//! Dependency resolution and action execution.
//!
//! [`Invoker::invoke`] runs a target's dependencies, in order and recursively,
//! before the target's own action. Dependencies are always invoked
//! synchronously; only the target being invoked honours its own `parallel`
//! flag. Nothing is memoized: a target reached through two paths runs twice.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::action::ActionContext;
use crate::config::RunConfig;
use crate::error::{BuildError, RunError, panic_message};
use crate::log::Logger;
use crate::registry::ThreadRegistry;
use crate::target::Target;

/// Executes targets against one project's target map for the duration of a run.
pub struct Invoker<'a> {
  targets: &'a HashMap<String, Target>,
  registry: &'a mut ThreadRegistry,
  config: &'a RunConfig,
  logger: Arc<dyn Logger>,
  base_dir: PathBuf,
}

impl<'a> Invoker<'a> {
  pub fn new(
    targets: &'a HashMap<String, Target>,
    registry: &'a mut ThreadRegistry,
    config: &'a RunConfig,
    logger: Arc<dyn Logger>,
  ) -> Self {
    let base_dir = match config.build_file.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
      _ => PathBuf::from("."),
    };

    Self {
      targets,
      registry,
      config,
      logger,
      base_dir,
    }
  }

  /// Directory that relative paths in actions resolve against.
  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  /// Look up a top-level target by name and invoke it.
  ///
  /// An unknown name is a structured error attributed to that name.
  pub fn invoke_named(&mut self, name: &str) -> Result<(), RunError> {
    let targets = self.targets;
    let target = targets.get(name).ok_or_else(|| {
      BuildError::unknown_target(name)
        .with_task(name)
        .with_build_file(self.config.build_file.clone())
    })?;

    self.invoke(target)
  }

  /// Run `target`'s dependency chain, then its own action.
  pub fn invoke(&mut self, target: &'a Target) -> Result<(), RunError> {
    let targets = self.targets;

    for dep in target.depends() {
      let dependency = targets.get(dep).ok_or_else(|| {
        BuildError::unknown_target(dep)
          .with_task(target.name())
          .with_build_file(self.config.build_file.clone())
          .with_line(target.line())
      })?;
      debug!(target = %target.name(), dependency = %dep, "invoking dependency");
      self.invoke(dependency)?;
    }

    let ctx = self.context_for(target);

    if target.is_parallel() {
      self.launch(target, ctx)
    } else {
      self.run_inline(target, &ctx)
    }
  }

  fn context_for(&self, target: &Target) -> ActionContext {
    ActionContext::new(target.name(), self.logger.clone())
      .with_build_file(self.config.build_file.clone())
      .with_line(target.line())
      .with_base_dir(self.base_dir.clone())
      .with_shell(self.config.shell.clone())
  }

  fn run_inline(&self, target: &Target, ctx: &ActionContext) -> Result<(), RunError> {
    info!(target = %target.name(), "running target");
    self.logger.log(target.name(), "running");

    match catch_unwind(AssertUnwindSafe(|| target.action().execute(ctx))) {
      Ok(Ok(())) => Ok(()),
      Ok(Err(e)) => Err(RunError::from_action(target.name(), e, self.config.debug)),
      Err(payload) => Err(RunError::unexpected(
        Some(target.name()),
        format!("panicked: {}", panic_message(&*payload)),
        self.config.debug,
      )),
    }
  }

  fn launch(&mut self, target: &Target, ctx: ActionContext) -> Result<(), RunError> {
    info!(target = %target.name(), "running target in parallel");
    self.logger.log(target.name(), "running in parallel");

    let id = self
      .registry
      .launch(target.name(), target.action().clone(), ctx)
      .map_err(|e| {
        RunError::unexpected(
          Some(target.name()),
          format!("failed to start thread: {}", e),
          self.config.debug,
        )
      })?;

    if self.config.debug {
      self.logger.log(target.name(), &format!("started thread {:?}", id));
    }

    Ok(())
  }
}
