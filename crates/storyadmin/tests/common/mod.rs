//! Shared test utilities for storyadmin integration tests.
//!
//! - `TestHarness` for isolated directories, a loaded store and a local bare
//!   git remote
//! - helpers for inspecting what reached the remote

pub mod harness;

pub use harness::TestHarness;
