//! Daemons under test
//!
//! Spawns network-element daemons with a given config and tears them down
//! again. Nothing here knows about the VTY protocol.

mod process;

pub use process::{resolve_executable, terminate, DaemonProcess};
