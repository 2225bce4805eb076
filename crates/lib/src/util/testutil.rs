//! Test utilities for taskmill-lib.
//!
//! Cross-platform shell snippets for tests that run `cmd` steps.

/// A command that echoes an environment variable.
#[cfg(unix)]
pub fn echo_env(var: &str) -> String {
  format!("echo \"${}\"", var)
}

#[cfg(windows)]
pub fn echo_env(var: &str) -> String {
  format!("Write-Output $env:{}", var)
}

/// A command that creates a file named "cwd_marker" in the current directory.
///
/// More reliable than comparing path strings across platforms.
#[cfg(unix)]
pub fn create_cwd_marker() -> &'static str {
  "touch cwd_marker"
}

#[cfg(windows)]
pub fn create_cwd_marker() -> &'static str {
  "New-Item -ItemType File -Path cwd_marker -Force | Out-Null"
}
