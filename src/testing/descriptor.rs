//! App descriptor: which daemons to test and with which configs
//!
//! Loaded from a TOML file the daemon project ships next to its sources:
//!
//! ```toml
//! [[apps]]
//! name = "bsc"
//! executable = "./src/osmo-bsc/osmo-bsc"
//! port = 4242
//! prompt = "OsmoBSC"
//!
//! [app_configs]
//! bsc = ["doc/examples/osmo-bsc/osmo-bsc.cfg"]
//!
//! [extensions.e1]
//! app = "bsc"
//! configs = ["doc/examples/osmo-bsc/osmo-bsc-e1.cfg"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::{Error, Result};

/// One daemon under test
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppDescriptor {
    /// Logical name, the key into `app_configs`
    pub name: String,
    /// Path to the daemon executable (bare names are looked up in `PATH`)
    pub executable: PathBuf,
    /// TCP port of the VTY
    pub port: u16,
    /// Name shown in the console prompt, e.g. `OsmoBSC`
    pub prompt: String,
    /// Host override for the VTY; defaults to the harness setting
    #[serde(default)]
    pub host: Option<String>,
}

/// Config files assigned to each app name, in test order
pub type AppConfigSet = BTreeMap<String, Vec<PathBuf>>;

/// An optional, named set of extra configs for one app
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Extension {
    pub app: String,
    pub configs: Vec<PathBuf>,
}

/// The full descriptor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub apps: Vec<AppDescriptor>,
    #[serde(default)]
    pub app_configs: AppConfigSet,
    #[serde(default)]
    pub extensions: BTreeMap<String, Extension>,
}

impl Descriptor {
    /// Load `file_name` from `search_dir`
    pub fn locate(search_dir: &Path, file_name: &str) -> Result<Self> {
        let path = search_dir.join(file_name);
        if !path.is_file() {
            return Err(Error::DescriptorNotFound {
                path: path.display().to_string(),
            });
        }
        Self::load(&path)
    }

    /// Load a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content).map_err(|reason| Error::DescriptorParse {
            path: path.display().to_string(),
            reason,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let descriptor: Self = toml::from_str(content).map_err(|e| e.to_string())?;

        for (ext_name, ext) in &descriptor.extensions {
            if !descriptor.apps.iter().any(|app| app.name == ext.app) {
                return Err(format!(
                    "extension '{}' refers to unknown app '{}'",
                    ext_name, ext.app
                ));
            }
        }

        Ok(descriptor)
    }

    /// Append the configs of extension `name` to its app's config list
    pub fn extend(&mut self, name: &str) -> Result<()> {
        let ext = self
            .extensions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownExtension(name.to_string()))?;

        self.app_configs
            .entry(ext.app)
            .or_default()
            .extend(ext.configs);
        Ok(())
    }

    /// Configs assigned to `app`, in order
    pub fn configs_for(&self, app: &AppDescriptor) -> &[PathBuf] {
        self.app_configs
            .get(&app.name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[apps]]
name = "nitb"
executable = "./src/osmo-nitb/osmo-nitb"
port = 4242
prompt = "OpenBSC"

[[apps]]
name = "bsc_hack"
executable = "./src/osmo-nitb/bsc_hack"
port = 4243
prompt = "OpenBSC"
host = "::1"

[app_configs]
nitb = ["doc/examples/osmo-nitb/nanobts/openbsc.cfg"]

[extensions.e1]
app = "nitb"
configs = ["doc/examples/osmo-nitb/bs11/openbsc.cfg", "doc/examples/osmo-nitb/rbs2308/openbsc.cfg"]
"#;

    #[test]
    fn test_parse_descriptor() {
        let descriptor = Descriptor::parse(SAMPLE).unwrap();
        assert_eq!(descriptor.apps.len(), 2);
        assert_eq!(descriptor.apps[0].port, 4242);
        assert_eq!(descriptor.apps[0].host, None);
        assert_eq!(descriptor.apps[1].host.as_deref(), Some("::1"));
        assert_eq!(descriptor.configs_for(&descriptor.apps[0]).len(), 1);
        // No config list for the second app is not an error
        assert!(descriptor.configs_for(&descriptor.apps[1]).is_empty());
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut descriptor = Descriptor::parse(SAMPLE).unwrap();
        descriptor.extend("e1").unwrap();

        let configs = descriptor.configs_for(&descriptor.apps[0]);
        assert_eq!(
            configs,
            &[
                PathBuf::from("doc/examples/osmo-nitb/nanobts/openbsc.cfg"),
                PathBuf::from("doc/examples/osmo-nitb/bs11/openbsc.cfg"),
                PathBuf::from("doc/examples/osmo-nitb/rbs2308/openbsc.cfg"),
            ]
        );
    }

    #[test]
    fn test_extend_unknown() {
        let mut descriptor = Descriptor::parse(SAMPLE).unwrap();
        let err = descriptor.extend("sccplite").unwrap_err();
        assert!(matches!(err, Error::UnknownExtension(name) if name == "sccplite"));
    }

    #[test]
    fn test_extension_for_unknown_app_rejected() {
        let bad = r#"
[extensions.e1]
app = "ghost"
configs = []
"#;
        let reason = Descriptor::parse(bad).unwrap_err();
        assert!(reason.contains("ghost"));
    }

    #[test]
    fn test_locate_missing_names_path() {
        let temp = tempfile::tempdir().unwrap();
        let err = Descriptor::locate(temp.path(), "appdesc.toml").unwrap_err();
        match err {
            Error::DescriptorNotFound { path } => assert!(path.ends_with("appdesc.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_reports_parse_errors() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("appdesc.toml"), "[[apps]]\nname = 1\n").unwrap();
        let err = Descriptor::locate(temp.path(), "appdesc.toml").unwrap_err();
        assert!(matches!(err, Error::DescriptorParse { .. }));
    }
}
