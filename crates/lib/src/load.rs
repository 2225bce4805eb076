//! Build file evaluation.
//!
//! This module provides [`load_build_file`], which evaluates a Lua build file
//! and returns the [`BuildDecl`] it declared. Declarations are plain data: the
//! Lua VM is dropped once loading finishes, and [`BuildDecl::into_project`]
//! turns the declarations into a runnable [`Project`].

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::action::{Step, Steps};
use crate::lua::runtime;
use crate::project::Project;
use crate::target::Target;

/// Errors that can occur while loading a build file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  /// The build file does not exist.
  #[error("build file not found: {}", .0.display())]
  NotFound(PathBuf),

  /// Lua evaluation error.
  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  /// The Lua state was still borrowed after evaluation.
  #[error("build declarations still in use after evaluation")]
  StillBorrowed,
}

/// A target as declared in a build file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDecl {
  pub name: String,
  pub depends: Vec<String>,
  pub parallel: bool,
  /// Line of the `apply` function, if any.
  pub line: Option<u32>,
  pub steps: Vec<Step>,
}

/// Everything a build file declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDecl {
  /// Project name from `mill.project{}`.
  pub name: Option<String>,
  /// Default target from `mill.project{}`.
  pub default: Option<String>,
  /// Targets in declaration order.
  pub targets: Vec<TargetDecl>,
  /// Path of the build file these declarations came from.
  pub build_file: PathBuf,
}

impl BuildDecl {
  /// Add a target, replacing (in place) any earlier target with the same name.
  ///
  /// Returns the replaced declaration.
  pub fn insert_target(&mut self, target: TargetDecl) -> Option<TargetDecl> {
    match self.targets.iter_mut().find(|t| t.name == target.name) {
      Some(existing) => Some(std::mem::replace(existing, target)),
      None => {
        self.targets.push(target);
        None
      }
    }
  }

  pub fn target(&self, name: &str) -> Option<&TargetDecl> {
    self.targets.iter().find(|t| t.name == name)
  }

  /// Project name, falling back to the name of the build file's directory.
  pub fn project_name(&self) -> String {
    if let Some(name) = &self.name {
      return name.clone();
    }

    dunce::canonicalize(&self.build_file)
      .ok()
      .and_then(|p| p.parent().and_then(|d| d.file_name()).map(|n| n.to_string_lossy().to_string()))
      .unwrap_or_else(|| "project".to_string())
  }

  /// Build a [`Project`] whose targets run the declared steps.
  pub fn into_project(self) -> Project {
    let name = self.project_name();
    let targets = self.targets.into_iter().map(|t| {
      Target::new(t.name, Steps(t.steps))
        .depends_on(t.depends)
        .parallel(t.parallel)
        .with_line(t.line)
    });

    Project::new(name, self.default, targets)
  }
}

/// Evaluate a Lua build file and return its declarations.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use taskmill_lib::load::load_build_file;
///
/// let decl = load_build_file(Path::new("build.lua"))?;
/// println!("Targets: {}", decl.targets.len());
/// ```
pub fn load_build_file(path: &Path) -> Result<BuildDecl, LoadError> {
  if !path.is_file() {
    return Err(LoadError::NotFound(path.to_path_buf()));
  }

  let decl = Rc::new(RefCell::new(BuildDecl {
    build_file: path.to_path_buf(),
    ..Default::default()
  }));

  // Evaluate in a block so the Lua state (and its clones of `decl`) is
  // dropped before unwrapping the Rc
  {
    let lua = runtime::create_runtime(decl.clone())?;
    debug!(path = %path.display(), "evaluating build file");
    runtime::load_file(&lua, path)?;
  }

  let decl = Rc::try_unwrap(decl)
    .map_err(|_| LoadError::StillBorrowed)?
    .into_inner();

  info!(
    path = %path.display(),
    targets = decl.targets.len(),
    default = ?decl.default,
    "build file loaded"
  );

  Ok(decl)
}
