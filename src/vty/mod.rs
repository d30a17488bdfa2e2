//! VTY console protocol
//!
//! Line-oriented telnet console exposed by the daemons under test.

pub mod client;
pub mod codec;

pub use client::{Console, VtyClient};
pub use codec::{Prompt, PromptKind};
