//! Regex-based file selection.
//!
//! Used by the `copy` step to pick files out of a directory tree. Paths are
//! matched in their relative form (e.g. `src/main.rs`) with forward slashes on
//! every platform.

use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

/// Common patterns for build files.
pub mod patterns {
  pub const ALL_FILES: &str = r".*";
  pub const HIDDEN: &str = r"(^|/)\.[^/]+";
  pub const VCS: &str = r"(^|/)(\.git|\.hg|\.svn|CVS)(/|$)";
  pub const RUST: &str = r"\.rs$";
  pub const LUA: &str = r"\.lua$";
}

/// How a filter list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
  /// Keep files matching any filter.
  #[default]
  Include,
  /// Drop files matching any filter.
  Exclude,
}

/// Compile a list of patterns, reporting the first invalid one.
pub fn compile_filters<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, regex::Error> {
  patterns.iter().map(|p| Regex::new(p.as_ref())).collect()
}

/// Walk `base_dir` and return the relative paths of all files that pass the filters.
///
/// Directories are not returned. The result is sorted so the output is stable
/// across platforms.
pub fn filter_files(base_dir: &Path, filters: &[Regex], mode: FilterMode) -> std::io::Result<Vec<String>> {
  let mut files = Vec::new();

  for entry in WalkDir::new(base_dir).sort_by_file_name() {
    let entry = entry.map_err(std::io::Error::other)?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
    files.push(relative.to_string_lossy().replace('\\', "/"));
  }

  Ok(filter_file_list(files, filters, mode))
}

/// Filter a list of paths.
///
/// An empty filter list returns the input unchanged. Order is preserved.
pub fn filter_file_list(files: Vec<String>, filters: &[Regex], mode: FilterMode) -> Vec<String> {
  if filters.is_empty() {
    return files;
  }

  files
    .into_iter()
    .filter(|f| {
      let matched = filters.iter().any(|re| re.is_match(f));
      match mode {
        FilterMode::Include => matched,
        FilterMode::Exclude => !matched,
      }
    })
    .collect()
}
