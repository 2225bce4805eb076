//! taskmill-lib: Core types and logic for taskmill
//!
//! This crate provides the target execution engine used by the `mill` CLI:
//! - `Target`: a named unit of work with dependencies and a parallel flag
//! - `Project`: owns targets and runs them, joining parallel work at the end
//! - `Action`: the unit-of-work contract, with declarative `Steps` from build files
//! - `BuildError`: structured, attributable build failures
//! - `load`: evaluates Lua build files into declarations

pub mod action;
pub mod config;
pub mod error;
pub mod filter;
pub mod invoke;
pub mod load;
pub mod log;
pub mod lua;
pub mod project;
pub mod registry;
pub mod target;
pub mod util;

pub use action::{Action, ActionContext, Step, Steps};
pub use config::RunConfig;
pub use error::{ActionError, BuildError, RunError};
pub use log::{ConsoleLogger, Logger, MemoryLogger};
pub use project::{Project, RunReport, RunState, RunStatus};
pub use target::Target;
