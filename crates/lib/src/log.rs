//! The progress-logging collaborator.
//!
//! Targets and actions report progress through [`Logger::log`], which receives
//! the task name and a message. Engine diagnostics go through `tracing` instead.

use std::io::Write;
use std::sync::Mutex;

/// Receives progress messages from targets and actions.
pub trait Logger: Send + Sync {
  fn log(&self, task: &str, message: &str);
}

/// Where a [`ConsoleLogger`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stream {
  #[default]
  Stdout,
  Stderr,
}

/// Prints `    [task] message` lines.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
  stream: Stream,
}

impl ConsoleLogger {
  pub fn new(stream: Stream) -> Self {
    Self { stream }
  }
}

impl Logger for ConsoleLogger {
  fn log(&self, task: &str, message: &str) {
    let line = format_line(task, message);
    // A closed pipe must not take the build down with it.
    let _ = match self.stream {
      Stream::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
      Stream::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
    };
  }
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
  entries: Mutex<Vec<(String, String)>>,
}

impl MemoryLogger {
  pub fn new() -> Self {
    Self::default()
  }

  /// All recorded `(task, message)` pairs in the order they were logged.
  pub fn entries(&self) -> Vec<(String, String)> {
    self.entries.lock().map(|e| e.clone()).unwrap_or_default()
  }

  /// Messages logged for a single task.
  pub fn messages_for(&self, task: &str) -> Vec<String> {
    self
      .entries()
      .into_iter()
      .filter(|(t, _)| t == task)
      .map(|(_, m)| m)
      .collect()
  }

  /// Rendered lines, as a [`ConsoleLogger`] would have printed them.
  pub fn lines(&self) -> Vec<String> {
    self.entries().iter().map(|(t, m)| format_line(t, m)).collect()
  }
}

impl Logger for MemoryLogger {
  fn log(&self, task: &str, message: &str) {
    if let Ok(mut entries) = self.entries.lock() {
      entries.push((task.to_string(), message.to_string()));
    }
  }
}

fn format_line(task: &str, message: &str) -> String {
  format!("    [{}] {}", task, message)
}
