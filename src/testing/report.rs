//! Per-config and suite results

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

/// Outcome of testing one config with one app
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub app: String,
    pub config: PathBuf,
    /// Why the config failed; `None` means it passed
    pub failure: Option<String>,
    /// Commands with missing online help (informational only)
    pub doc_findings: usize,
    /// Path the daemon reported after `write`, if that probe ran
    pub written_config: Option<String>,
}

impl ConfigReport {
    pub fn new(app: &str, config: PathBuf) -> Self {
        Self {
            app: app.to_string(),
            config,
            failure: None,
            doc_findings: 0,
            written_config: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of a whole suite run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub configs: Vec<ConfigReport>,
    /// Apps none of whose configs ran: executable missing or won't start
    pub skipped_apps: Vec<String>,
    /// Configs not run because their app's daemon could not be started
    pub skipped_configs: Vec<PathBuf>,
    /// Sample configs on disk not assigned to any app
    pub untested: Vec<PathBuf>,
}

impl SuiteReport {
    /// True iff no exercised config failed
    ///
    /// Skipped apps and untested samples never fail a run.
    pub fn passed(&self) -> bool {
        self.configs.iter().all(ConfigReport::passed)
    }

    /// Record that `app` could not be started for `remaining` configs
    ///
    /// The app only counts as skipped if none of its configs ran before.
    pub fn skip_app(&mut self, app: &str, remaining: &[PathBuf]) {
        self.skipped_configs.extend_from_slice(remaining);
        if !self.configs.iter().any(|r| r.app == app) {
            self.skipped_apps.push(app.to_string());
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &ConfigReport> {
        self.configs.iter().filter(|r| !r.passed())
    }

    /// Process exit status: 0 if everything passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    /// Print a human-readable summary to stdout
    pub fn print_summary(&self) {
        println!();
        for report in &self.configs {
            if report.passed() {
                let docs = if report.doc_findings > 0 {
                    format!(" ({} undocumented)", report.doc_findings)
                } else {
                    String::new()
                };
                println!(
                    "  {} {} {}{}",
                    "✓".green(),
                    report.app.dimmed(),
                    report.config.display(),
                    docs.yellow()
                );
            } else {
                println!(
                    "  {} {} {}: {}",
                    "✗".red(),
                    report.app.dimmed(),
                    report.config.display(),
                    report.failure.as_deref().unwrap_or_default()
                );
            }
        }

        for app in &self.skipped_apps {
            println!("  {} {} (skipped)", "-".dimmed(), app.dimmed());
        }
        for config in &self.skipped_configs {
            println!("  {} {} (not run)", "-".dimmed(), config.display());
        }

        let failed = self.failed().count();
        let total = self.configs.len();
        println!();
        if failed == 0 {
            println!(
                "{} {}",
                "✓".green().bold(),
                format!("{} of {} configs passed", total, total).green().bold()
            );
        } else {
            println!(
                "{} {}",
                "✗".red().bold(),
                format!("{} of {} configs failed", failed, total).red().bold()
            );
        }
        if !self.untested.is_empty() {
            println!(
                "  {}",
                format!("{} sample configs not tested", self.untested.len()).yellow()
            );
        }
    }
}
