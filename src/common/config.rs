//! Harness settings file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main settings structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Console connection settings
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Suite layout settings
    #[serde(default)]
    pub suite: SuiteConfig,
}

/// Console connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    /// Host the daemons bind their console to, unless an app overrides it
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Delay after launching a daemon before the first connect attempt
    #[serde(default = "default_settle")]
    pub settle_millis: u64,

    /// Give up waiting for the console to accept connections after this
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Bound on a single command round trip
    #[serde(default = "default_command")]
    pub command_secs: u64,

    /// First retry delay while polling for the console
    #[serde(default = "default_poll_initial")]
    pub poll_initial_millis: u64,

    /// Retry delay cap while polling for the console
    #[serde(default = "default_poll_max")]
    pub poll_max_millis: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            settle_millis: default_settle(),
            connect_secs: default_connect(),
            command_secs: default_command(),
            poll_initial_millis: default_poll_initial(),
            poll_max_millis: default_poll_max(),
        }
    }
}

fn default_settle() -> u64 {
    250
}
fn default_connect() -> u64 {
    10
}
fn default_command() -> u64 {
    10
}
fn default_poll_initial() -> u64 {
    50
}
fn default_poll_max() -> u64 {
    1000
}

impl Timeouts {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn poll_initial(&self) -> Duration {
        Duration::from_millis(self.poll_initial_millis)
    }

    pub fn poll_max(&self) -> Duration {
        Duration::from_millis(self.poll_max_millis.max(self.poll_initial_millis))
    }
}

/// Suite layout settings
#[derive(Debug, Deserialize, Clone)]
pub struct SuiteConfig {
    /// Scratch directory for config copies, wiped per config
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Root that is searched for sample configs nobody tests
    #[serde(default = "default_samples_root")]
    pub samples_root: PathBuf,

    /// File extension of sample configs (without the dot)
    #[serde(default = "default_sample_extension")]
    pub sample_extension: String,

    /// File name of the app descriptor inside the descriptor search path
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            samples_root: default_samples_root(),
            sample_extension: default_sample_extension(),
            descriptor_file: default_descriptor_file(),
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("writtenconfig")
}

fn default_samples_root() -> PathBuf {
    PathBuf::from("doc/examples")
}

fn default_sample_extension() -> String {
    "cfg".to_string()
}

fn default_descriptor_file() -> String {
    "appdesc.toml".to_string()
}

impl Config {
    /// Load settings from the default settings file
    ///
    /// Returns default settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load settings from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.console.host, "127.0.0.1");
        assert_eq!(config.timeouts.connect(), Duration::from_secs(10));
        assert_eq!(config.suite.scratch_dir, PathBuf::from("writtenconfig"));
        assert_eq!(config.suite.sample_extension, "cfg");
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
[timeouts]
command_secs = 3
poll_initial_millis = 200
poll_max_millis = 100

[suite]
samples_root = "examples/configs"
"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.command(), Duration::from_secs(3));
        assert_eq!(config.timeouts.settle(), Duration::from_millis(250));
        // The cap never drops below the first delay
        assert_eq!(config.timeouts.poll_max(), Duration::from_millis(200));
        assert_eq!(config.suite.samples_root, PathBuf::from("examples/configs"));
        assert_eq!(config.suite.descriptor_file, "appdesc.toml");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = Config::from_toml("[timeouts\n").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }
}
