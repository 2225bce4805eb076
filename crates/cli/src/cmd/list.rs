use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use taskmill_lib::load::load_build_file;

use super::locate_build_file;
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

#[derive(Debug, Serialize)]
struct ListOutput {
  project: String,
  default: Option<String>,
  build_file: String,
  targets: Vec<TargetItem>,
}

#[derive(Debug, Serialize)]
struct TargetItem {
  name: String,
  depends: Vec<String>,
  parallel: bool,
  steps: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  line: Option<u32>,
}

/// List the project and its targets without running anything.
pub fn cmd_list(file: &Path, output: OutputFormat) -> Result<ExitCode> {
  let Some(path) = locate_build_file(file, output) else {
    return Ok(ExitCode::FAILURE);
  };

  let decl = load_build_file(&path).with_context(|| format!("Failed to load {}", path.display()))?;

  let build_file = path.display().to_string();
  let steps: HashMap<String, usize> = decl.targets.iter().map(|t| (t.name.clone(), t.steps.len())).collect();
  let project = decl.into_project();

  let targets: Vec<TargetItem> = project
    .target_names()
    .into_iter()
    .filter_map(|name| project.target(name))
    .map(|t| TargetItem {
      name: t.name().to_string(),
      depends: t.depends().to_vec(),
      parallel: t.is_parallel(),
      steps: steps.get(t.name()).copied().unwrap_or_default(),
      line: t.line(),
    })
    .collect();

  let list = ListOutput {
    project: project.name().to_string(),
    default: project.default_target().map(str::to_string),
    build_file,
    targets,
  };

  if output.is_json() {
    print_json(&list)?;
    return Ok(ExitCode::SUCCESS);
  }

  print_stat("Project", &list.project);
  print_stat("Default", list.default.as_deref().unwrap_or("(none)"));
  println!();

  for target in &list.targets {
    let parallel = if target.parallel { " (parallel)" } else { "" };
    if target.depends.is_empty() {
      println!("  {}{}", target.name, parallel);
    } else {
      println!(
        "  {}{} {} {}",
        target.name,
        parallel,
        symbols::ARROW,
        target.depends.join(", ")
      );
    }
  }

  println!();
  print_info(&format!("{} target(s) total", list.targets.len()));

  Ok(ExitCode::SUCCESS)
}
