//! Cmd step implementation.
//!
//! Commands run through the platform shell in the build file's directory (or an
//! explicit `cwd`) and inherit the caller's environment, extended with any
//! user-specified variables.

use std::process::Command;

use tracing::{debug, info};

use crate::action::{ActionContext, CmdOpts};
use crate::error::ActionError;

/// Execute a Cmd step.
///
/// Each line the command prints on stdout is logged for the task. A non-zero
/// exit status is a structured build error; failing to spawn the shell at all
/// is an I/O error.
pub fn execute_cmd(opts: &CmdOpts, ctx: &ActionContext) -> Result<(), ActionError> {
  info!(task = %ctx.task(), cmd = %opts.cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell(ctx.shell());

  let working_dir = match &opts.cwd {
    Some(cwd) => ctx.resolve(cwd),
    None => ctx.base_dir().to_path_buf(),
  };

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).arg(&opts.cmd).current_dir(&working_dir);

  if let Some(user_env) = &opts.env {
    for (key, value) in user_env {
      command.env(key, value);
    }
  }

  debug!(shell = %shell_cmd, working_dir = ?working_dir, "spawning process");

  let output = command.output()?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
    ctx.log(line);
  }

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
      for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        ctx.log(line);
      }
    }

    let message = match output.status.code() {
      Some(code) => format!("command failed with exit code {}: {}", code, opts.cmd),
      None => format!("command terminated by signal: {}", opts.cmd),
    };
    return Err(ctx.fail(message));
  }

  Ok(())
}

/// Get the shell command and arguments for the current platform.
///
/// # Arguments
///
/// * `override_shell` - Optional shell override from the run configuration
///
/// # Returns
///
/// A tuple of (shell_command, shell_arguments) where the last argument is
/// the flag that precedes the command string (e.g., "-c" for sh).
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      // Assume Unix-style shell (bash, sh, zsh, etc.)
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
