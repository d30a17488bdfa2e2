//! VTY config checker - regression tests for daemon sample configs
//!
//! Starts network-element daemons with each of their sample configs and
//! drives their telnet-style VTY console to check the config loads, can be
//! written back, and that every command is documented.

pub mod common;
pub mod daemon;
pub mod testing;
pub mod vty;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{Descriptor, Suite, SuiteOptions, SuiteReport};
