mod list;
mod run;

use std::path::{Path, PathBuf};

use crate::output::{OutputFormat, print_line};

pub use list::cmd_list;
pub use run::{RunArgs, cmd_run};

/// Announce the build file in use, or report that it is missing.
///
/// Returns the canonical path when the file exists.
fn locate_build_file(file: &Path, output: OutputFormat) -> Option<PathBuf> {
  if !file.is_file() {
    print_line(&format!("Buildfile: {} not found!", file.display()), output);
    return None;
  }

  let path = dunce::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
  print_line(&format!("Buildfile: {}", path.display()), output);
  Some(path)
}
