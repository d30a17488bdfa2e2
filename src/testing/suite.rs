//! Suite driver: every config of every app
//!
//! Configs run strictly one after another; they share the scratch directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::daemon::resolve_executable;

use super::descriptor::{AppConfigSet, Descriptor};
use super::driver::ConfigTest;
use super::report::SuiteReport;

/// Knobs for one suite run
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// Scratch directory for config copies
    pub scratch_dir: PathBuf,
    /// Where to look for sample configs nobody tests; `None` skips the check
    pub samples_root: Option<PathBuf>,
    pub verbose: bool,
    /// Remove the scratch directory when done
    pub cleanup: bool,
}

impl SuiteOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scratch_dir: config.suite.scratch_dir.clone(),
            samples_root: Some(config.suite.samples_root.clone()),
            verbose: false,
            cleanup: false,
        }
    }
}

/// Runs all configs of all apps in a descriptor
pub struct Suite<'a> {
    descriptor: &'a Descriptor,
    settings: &'a Config,
    options: SuiteOptions,
}

impl<'a> Suite<'a> {
    pub fn new(descriptor: &'a Descriptor, settings: &'a Config, options: SuiteOptions) -> Self {
        Self {
            descriptor,
            settings,
            options,
        }
    }

    pub async fn run(&self) -> Result<SuiteReport> {
        let mut report = SuiteReport::default();

        if let Some(root) = &self.options.samples_root {
            report.untested = check_configs_tested(
                root,
                &self.settings.suite.sample_extension,
                &self.descriptor.app_configs,
            );
        }

        for app in &self.descriptor.apps {
            let Some(executable) = resolve_executable(&app.executable) else {
                tracing::warn!("Skipping app {} (not found)", app.executable.display());
                report.skipped_apps.push(app.name.clone());
                continue;
            };

            let configs = self.descriptor.configs_for(app);
            if configs.is_empty() {
                tracing::warn!("No configs assigned to app {}", app.name);
            }

            let test = ConfigTest::new(
                app,
                executable,
                self.settings,
                &self.options.scratch_dir,
                self.options.verbose,
            );

            for (i, config) in configs.iter().enumerate() {
                match test.run(config).await {
                    Ok(config_report) => report.configs.push(config_report),
                    Err(e @ Error::Launch { .. }) => {
                        tracing::warn!("Skipping app {} ({})", app.name, e);
                        report.skip_app(&app.name, &configs[i..]);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if self.options.cleanup {
            paths::remove_dir(&self.options.scratch_dir)?;
        }

        Ok(report)
    }
}

/// Warn about sample configs under `root` no app is assigned
///
/// Returns the untested files. Diagnostic only; never fails a run, even
/// when parts of `root` cannot be read.
pub fn check_configs_tested(
    root: &Path,
    extension: &str,
    app_configs: &AppConfigSet,
) -> Vec<PathBuf> {
    let assigned: HashSet<PathBuf> = app_configs
        .values()
        .flatten()
        .map(|path| paths::normalize(path))
        .collect();

    let untested: Vec<PathBuf> = paths::discover_configs(root, extension)
        .into_iter()
        .filter(|path| !assigned.contains(&paths::normalize(path)))
        .collect();

    for config in &untested {
        tracing::warn!("{} is not being tested", config.display());
    }

    untested
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_configs_tested() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("doc").join("examples");
        std::fs::create_dir_all(root.join("osmo-bsc")).unwrap();
        std::fs::write(root.join("osmo-bsc").join("osmo-bsc.cfg"), "").unwrap();
        std::fs::write(root.join("osmo-bsc").join("orphan.cfg"), "").unwrap();

        let mut app_configs = AppConfigSet::new();
        app_configs.insert(
            "bsc".to_string(),
            // Written differently but the same file
            vec![root.join(".").join("osmo-bsc").join("osmo-bsc.cfg")],
        );

        let untested = check_configs_tested(&root, "cfg", &app_configs);
        assert_eq!(untested, vec![root.join("osmo-bsc").join("orphan.cfg")]);
    }

    #[test]
    fn test_check_configs_tested_missing_root() {
        let temp = tempfile::tempdir().unwrap();
        let untested = check_configs_tested(&temp.path().join("nope"), "cfg", &AppConfigSet::new());
        assert!(untested.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_samples_do_not_abort_suite() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("examples");
        let locked = root.join("osmo-nitb");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("nitb.cfg"), "").unwrap();
        std::fs::write(root.join("orphan.cfg"), "").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let descriptor = Descriptor::default();
        let settings = Config::default();
        let options = SuiteOptions {
            scratch_dir: temp.path().join("scratch"),
            samples_root: Some(root.clone()),
            verbose: false,
            cleanup: false,
        };
        let result = Suite::new(&descriptor, &settings, options).run().await;

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let report = result.unwrap();
        assert!(report.untested.contains(&root.join("orphan.cfg")));
        assert_eq!(report.exit_code(), 0);
    }
}
