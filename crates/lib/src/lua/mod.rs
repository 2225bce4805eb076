//! Lua runtime and build-file evaluation.
//!
//! This module provides the Lua execution environment for build files. It
//! manages the Lua VM lifecycle and registers the `mill` global table.
//!
//! # Submodules
//!
//! - [`globals`] - The `mill` table (`mill.project{}`, `mill.target{}`, platform info)
//! - [`runtime`] - Low-level Lua VM management
//! - [`target`] - `mill.target{}` and the step-recording `ctx` userdata

pub mod globals;
pub mod runtime;
pub mod target;
