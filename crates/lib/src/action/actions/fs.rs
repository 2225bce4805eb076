//! File system steps: `mkdir`, `copy` and `delete`.

use std::path::Path;

use tracing::debug;

use crate::action::{ActionContext, CopyOpts};
use crate::error::ActionError;
use crate::filter::{FilterMode, compile_filters, filter_file_list, filter_files};

/// Create a directory and any missing parents.
pub fn make_dir(path: &str, ctx: &ActionContext) -> Result<(), ActionError> {
  let dir = ctx.resolve(path);
  if !dir.is_dir() {
    ctx.log(&format!("Created dir: {}", path));
  }
  std::fs::create_dir_all(&dir)?;
  Ok(())
}

/// Copy a file, or the filtered contents of a directory tree.
///
/// Copying a file into an existing directory keeps the file name. For trees,
/// `include` selects files and `exclude` then drops files; paths are matched
/// relative to the source directory.
pub fn copy(opts: &CopyOpts, ctx: &ActionContext) -> Result<(), ActionError> {
  let src = ctx.resolve(&opts.from);
  let dest = ctx.resolve(&opts.to);

  if !src.exists() {
    return Err(ctx.fail(format!("Specified source does not exist: {}", opts.from)));
  }

  if src.is_file() {
    let target = match src.file_name() {
      Some(name) if dest.is_dir() => dest.join(name),
      _ => dest,
    };
    ctx.log(&format!("Copying 1 file to {}", opts.to));
    copy_file(&src, &target)?;
    return Ok(());
  }

  let include = compile_filters(&opts.include).map_err(|e| ctx.fail(format!("invalid include filter: {}", e)))?;
  let exclude = compile_filters(&opts.exclude).map_err(|e| ctx.fail(format!("invalid exclude filter: {}", e)))?;

  let selected = filter_files(&src, &include, FilterMode::Include)?;
  let files = filter_file_list(selected, &exclude, FilterMode::Exclude);

  ctx.log(&format!("Copying {} files to {}", files.len(), opts.to));
  std::fs::create_dir_all(&dest)?;

  for file in &files {
    copy_file(&src.join(file), &dest.join(file))?;
  }

  Ok(())
}

/// Remove a file or directory tree. A missing path is not an error.
pub fn delete(path: &str, ctx: &ActionContext) -> Result<(), ActionError> {
  let target = ctx.resolve(path);

  if target.is_dir() {
    ctx.log(&format!("Deleting directory {}", path));
    std::fs::remove_dir_all(&target)?;
  } else if target.exists() {
    ctx.log(&format!("Deleting {}", path));
    std::fs::remove_file(&target)?;
  } else {
    debug!(path = %target.display(), "nothing to delete");
  }

  Ok(())
}

fn copy_file(from: &Path, to: &Path) -> std::io::Result<()> {
  if let Some(parent) = to.parent() {
    std::fs::create_dir_all(parent)?;
  }
  debug!(from = %from.display(), to = %to.display(), "copying file");
  std::fs::copy(from, to)?;
  Ok(())
}
