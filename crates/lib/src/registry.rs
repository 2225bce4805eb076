//! The thread registry for parallel targets.
//!
//! Every parallel target's action runs on its own OS thread. The registry
//! records each thread under its [`ThreadId`] as soon as it is spawned, and is
//! drained once at the end of a run: each thread is waited on for at most the
//! join timeout. Threads that outlive the wait are detached, never cancelled.
//!
//! Inserts happen only on the synchronous invoking path and draining only in
//! the final join phase, so the registry itself needs no locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::action::{Action, ActionContext};
use crate::error::{ActionError, panic_message};

/// How a parallel target ended, as observed by the join phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParallelStatus {
  /// The action returned successfully.
  Completed,
  /// The action returned an error.
  Failed { message: String, structured: bool },
  /// The action panicked.
  Panicked { message: String },
  /// The action did not finish within the join timeout and was left running.
  TimedOut,
}

/// Outcome of one parallel target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParallelOutcome {
  pub target: String,
  #[serde(flatten)]
  pub status: ParallelStatus,
}

impl ParallelOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self.status, ParallelStatus::Completed)
  }
}

/// A launched thread that has not been joined yet.
struct InFlight {
  target: String,
  seq: u64,
  handle: JoinHandle<()>,
  done: Receiver<Result<(), ActionError>>,
}

impl InFlight {
  fn join(self, timeout: Duration) -> ParallelOutcome {
    let status = match self.done.recv_timeout(timeout) {
      Ok(result) => {
        // The result was sent as the thread's last act; this join is immediate.
        let _ = self.handle.join();
        match result {
          Ok(()) => ParallelStatus::Completed,
          Err(e) => ParallelStatus::Failed {
            structured: e.is_structured(),
            message: e.to_string(),
          },
        }
      }
      Err(RecvTimeoutError::Timeout) => {
        warn!(target = %self.target, timeout = ?timeout, "parallel target still running, detaching");
        ParallelStatus::TimedOut
      }
      // The sender is dropped without sending only when the action panicked.
      Err(RecvTimeoutError::Disconnected) => match self.handle.join() {
        Err(payload) => ParallelStatus::Panicked {
          message: panic_message(&*payload),
        },
        Ok(()) => ParallelStatus::Completed,
      },
    };

    ParallelOutcome {
      target: self.target,
      status,
    }
  }
}

/// Tracks in-flight parallel target executions for later joining.
#[derive(Default)]
pub struct ThreadRegistry {
  handles: HashMap<ThreadId, InFlight>,
  next_seq: u64,
}

impl ThreadRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start `action` on a new thread and record it.
  ///
  /// The thread is registered before this returns. The caller does not wait
  /// for the action; its result is only observed by [`drain`](Self::drain).
  pub fn launch(&mut self, target: &str, action: Arc<dyn Action>, ctx: ActionContext) -> std::io::Result<ThreadId> {
    let (tx, rx) = mpsc::channel();

    let handle = thread::Builder::new()
      .name(thread_name(target))
      .spawn(move || {
        let result = action.execute(&ctx);
        if let Err(e) = &result {
          debug!(target = %ctx.task(), error = %e, "parallel target failed");
        }
        // The registry may already have given up on this thread.
        let _ = tx.send(result);
      })?;

    let id = handle.thread().id();
    let seq = self.next_seq;
    self.next_seq += 1;

    debug!(target = %target, thread = ?id, "registered parallel target");
    self.handles.insert(
      id,
      InFlight {
        target: target.to_string(),
        seq,
        handle,
        done: rx,
      },
    );

    Ok(id)
  }

  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  pub fn contains(&self, id: &ThreadId) -> bool {
    self.handles.contains_key(id)
  }

  /// Names of the targets still registered, in launch order.
  pub fn pending(&self) -> Vec<String> {
    let mut pending: Vec<_> = self.handles.values().map(|f| (f.seq, f.target.clone())).collect();
    pending.sort_by_key(|(seq, _)| *seq);
    pending.into_iter().map(|(_, target)| target).collect()
  }

  /// Join every registered thread in launch order, waiting up to `timeout` for each.
  ///
  /// The registry is empty afterwards.
  pub fn drain(&mut self, timeout: Duration) -> Vec<ParallelOutcome> {
    let mut in_flight: Vec<InFlight> = self.handles.drain().map(|(_, f)| f).collect();
    in_flight.sort_by_key(|f| f.seq);

    in_flight.into_iter().map(|f| f.join(timeout)).collect()
  }
}

/// Name given to the thread that runs a parallel target.
pub fn thread_name(target: &str) -> String {
  format!("mill-{}", target)
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::time::Instant;

  use tracing_test::traced_test;

  use super::*;
  use crate::log::MemoryLogger;

  fn ctx(task: &str) -> ActionContext {
    ActionContext::new(task, Arc::new(MemoryLogger::new()))
  }

  fn shared(action: impl Action + 'static) -> Arc<dyn Action> {
    Arc::new(action)
  }

  #[test]
  fn launch_registers_before_returning() {
    let mut registry = ThreadRegistry::new();
    let id = registry
      .launch(
        "slow",
        shared(|_: &ActionContext| -> Result<(), ActionError> {
          thread::sleep(Duration::from_millis(50));
          Ok(())
        }),
        ctx("slow"),
      )
      .unwrap();

    assert!(registry.contains(&id));
    assert_eq!(registry.pending(), vec!["slow"]);

    let outcomes = registry.drain(Duration::from_secs(5));
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_completed());
    assert!(registry.is_empty());
  }

  #[test]
  fn thread_is_named_after_target() {
    let mut registry = ThreadRegistry::new();
    registry
      .launch(
        "docs",
        shared(|_: &ActionContext| -> Result<(), ActionError> {
          assert_eq!(thread::current().name(), Some("mill-docs"));
          Ok(())
        }),
        ctx("docs"),
      )
      .unwrap();

    let outcomes = registry.drain(Duration::from_secs(5));
    assert!(outcomes[0].is_completed(), "{:?}", outcomes[0]);
  }

  #[test]
  fn drain_reports_failures_and_panics_in_launch_order() {
    let mut registry = ThreadRegistry::new();
    registry
      .launch(
        "first",
        shared(|c: &ActionContext| -> Result<(), ActionError> { Err(c.fail("broken")) }),
        ctx("first"),
      )
      .unwrap();
    registry
      .launch(
        "second",
        shared(|_: &ActionContext| -> Result<(), ActionError> { panic!("kaboom") }),
        ctx("second"),
      )
      .unwrap();
    registry
      .launch(
        "third",
        shared(|_: &ActionContext| -> Result<(), ActionError> { Err(ActionError::Unexpected("odd".to_string())) }),
        ctx("third"),
      )
      .unwrap();

    let outcomes = registry.drain(Duration::from_secs(5));
    let targets: Vec<_> = outcomes.iter().map(|o| o.target.as_str()).collect();
    assert_eq!(targets, vec!["first", "second", "third"]);

    assert!(matches!(
      &outcomes[0].status,
      ParallelStatus::Failed { structured: true, message } if message.ends_with("broken")
    ));
    assert_eq!(
      outcomes[1].status,
      ParallelStatus::Panicked {
        message: "kaboom".to_string()
      }
    );
    assert_eq!(
      outcomes[2].status,
      ParallelStatus::Failed {
        message: "odd".to_string(),
        structured: false
      }
    );
  }

  #[test]
  fn drain_times_out_without_cancelling() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    let mut registry = ThreadRegistry::new();
    registry
      .launch(
        "sleepy",
        shared(move |_: &ActionContext| -> Result<(), ActionError> {
          thread::sleep(Duration::from_millis(300));
          flag.store(true, Ordering::SeqCst);
          Ok(())
        }),
        ctx("sleepy"),
      )
      .unwrap();

    let start = Instant::now();
    let outcomes = registry.drain(Duration::from_millis(20));
    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(outcomes[0].status, ParallelStatus::TimedOut);
    assert!(registry.is_empty());

    // The detached thread keeps running to completion.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !finished.load(Ordering::SeqCst) && Instant::now() < deadline {
      thread::sleep(Duration::from_millis(10));
    }
    assert!(finished.load(Ordering::SeqCst));
  }

  #[traced_test]
  #[test]
  fn timeout_is_logged() {
    let mut registry = ThreadRegistry::new();
    registry
      .launch(
        "stuck",
        shared(|_: &ActionContext| -> Result<(), ActionError> {
          thread::sleep(Duration::from_millis(200));
          Ok(())
        }),
        ctx("stuck"),
      )
      .unwrap();

    registry.drain(Duration::from_millis(10));
    assert!(logs_contain("parallel target still running, detaching"));
  }

  #[test]
  fn outcome_serializes_flat() {
    let outcome = ParallelOutcome {
      target: "docs".to_string(),
      status: ParallelStatus::TimedOut,
    };
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["target"], "docs");
    assert_eq!(json["status"], "timed_out");
  }
}
