//! Individual step implementations.
//!
//! - [`cmd`] - Shell command execution with environment and working directory support
//! - [`fs`] - Directory creation, filtered copies and removal

pub mod cmd;
pub mod fs;
