//! Error types for the VTY config checker
//!
//! Messages name the command line or file involved so a failing config can
//! be reproduced by hand.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the config checker
#[derive(Error, Debug)]
pub enum Error {
    // === Daemon Process Errors ===
    #[error("Failed to start '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Daemon '{command}' exited before its console came up ({status})")]
    DaemonExited { command: String, status: String },

    // === Console Errors ===
    #[error("Failed to connect to console at {address}: {source}")]
    ConnectionFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Console closed the connection")]
    ConnectionClosed,

    #[error("Timed out after {millis} ms waiting for {operation}")]
    Timeout { operation: String, millis: u64 },

    #[error("Console protocol error: {0}")]
    Protocol(String),

    // === Per-config Test Errors ===
    #[error("Failed to verify {command} ({probe}): {source}")]
    ConfigTest {
        command: String,
        probe: String,
        #[source]
        source: Box<Error>,
    },

    // === Descriptor Errors ===
    #[error("App descriptor not found at '{path}'. Set its location with -p <dir>")]
    DescriptorNotFound { path: String },

    #[error("Invalid app descriptor '{path}': {reason}")]
    DescriptorParse { path: String, reason: String },

    #[error("Unknown config extension '{0}'")]
    UnknownExtension(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a timeout error for the named operation
    pub fn timeout(operation: &str, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            millis: after.as_millis() as u64,
        }
    }

    /// Create a connection failure for `host:port`
    pub fn connection_failed(host: &str, port: u16, source: io::Error) -> Self {
        Self::ConnectionFailed {
            address: format!("{}:{}", host, port),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_messages_name_the_command() {
        let err = Error::ConfigTest {
            command: "osmo-bsc -c bsc.cfg".to_string(),
            probe: "round-trip".to_string(),
            source: Box::new(Error::ConnectionClosed),
        };
        let msg = err.to_string();
        assert!(msg.contains("osmo-bsc -c bsc.cfg"));
        assert!(msg.contains("round-trip"));

        let timeout = Error::timeout("console prompt", Duration::from_millis(1500));
        assert_eq!(
            timeout.to_string(),
            "Timed out after 1500 ms waiting for console prompt"
        );
    }
}
