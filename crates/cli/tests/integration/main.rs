//! CLI integration tests for mill.

mod common;
mod list_tests;
mod run_tests;
