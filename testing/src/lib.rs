//! Shared test fixtures for the config server workspace.
//!
//! Provides:
//! - A single shared MongoDB testcontainer (port 27017)
//! - Sample coordinates matching the layout used across provider tests
//!
//! The container is lazily initialized once per test process and
//! automatically cleaned up when the process exits. When Docker is not
//! available the fixture resolves to `None` and callers skip.

mod fixtures;

pub use fixtures::*;
