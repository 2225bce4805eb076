mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use taskmill_lib::config::DEFAULT_BUILD_FILE;
use tracing_subscriber::EnvFilter;

use crate::cmd::{RunArgs, cmd_list, cmd_run};
use crate::output::{OutputFormat, print_error};

/// mill - Run targets declared in a Lua build file
#[derive(Parser, Debug)]
#[command(name = "mill")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug output (thread launches, joins, backtraces)
  #[arg(short, long)]
  debug: bool,

  /// Path to the build file
  #[arg(short, long, default_value = DEFAULT_BUILD_FILE)]
  file: PathBuf,

  /// How long to wait for each parallel target at the end of a run (e.g., "10s", "500ms")
  #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
  join_timeout: Duration,

  /// Shell used to run `cmd` steps (default: /bin/sh, or powershell.exe on Windows)
  #[arg(long)]
  shell: Option<String>,

  /// Output format
  #[arg(long, value_enum, default_value = "text")]
  format: OutputFormat,

  /// List the project's targets instead of running them
  #[arg(short, long)]
  list: bool,

  /// Targets to run (the default target when empty)
  targets: Vec<String>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  // RUST_LOG wins; otherwise --debug raises the level
  let default_level = if cli.debug { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .init();

  let result = if cli.list {
    cmd_list(&cli.file, cli.format)
  } else {
    cmd_run(RunArgs {
      file: cli.file,
      targets: cli.targets,
      debug: cli.debug,
      join_timeout: cli.join_timeout,
      shell: cli.shell,
      output: cli.format,
    })
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
