//! Checks run against a freshly connected console
//!
//! Each probe gets its own session on its own daemon instance and defines
//! its own result type.

use async_trait::async_trait;
use serde::Serialize;

use crate::common::Result;
use crate::vty::Console;

/// Marker the console prints where a command's help text is missing
const MISSING_DOC: &str = "(null)";

/// Start of each command block in the online help dump
const COMMAND_TAG: &str = "<command";

/// A check against one console session
#[async_trait]
pub trait Probe: Send + Sync {
    type Output: Send;

    /// Short name for diagnostics
    fn name(&self) -> &'static str;

    async fn run(&self, console: &mut dyn Console) -> Result<Self::Output>;
}

/// One command whose online help has undocumented parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocFinding {
    /// `<command` plus the rest of the block's first line
    pub header: String,
    /// Every line of the block containing the missing-doc marker
    pub lines: Vec<String>,
}

/// Result of the documentation probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocReport {
    pub findings: Vec<DocFinding>,
}

impl DocReport {
    pub fn count(&self) -> usize {
        self.findings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Scan an online help dump for undocumented commands
///
/// The same missing text shared by several commands is reported once per
/// command.
pub fn scan_online_help(dump: &str) -> DocReport {
    let findings = dump
        .split(COMMAND_TAG)
        .filter(|block| block.contains(MISSING_DOC))
        .map(|block| {
            let first_line = block.split('\n').next().unwrap_or_default();
            let header = format!("{}{}", COMMAND_TAG, first_line);
            let lines = block
                .split('\n')
                .filter(|line| line.contains(MISSING_DOC))
                .map(str::to_string)
                .collect();
            DocFinding { header, lines }
        })
        .collect();

    DocReport { findings }
}

/// Checks every command in the online help has documentation
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentationProbe;

#[async_trait]
impl Probe for DocumentationProbe {
    type Output = DocReport;

    fn name(&self) -> &'static str {
        "documentation"
    }

    async fn run(&self, console: &mut dyn Console) -> Result<DocReport> {
        let dump = console.command("show online-help").await?;
        let report = scan_online_help(&dump);

        for finding in &report.findings {
            tracing::warn!(
                "Documentation error (missing docs):\n{}\n{}",
                finding.header,
                finding.lines.join("\n")
            );
        }

        Ok(report)
    }
}

/// Makes the daemon write its running config back to disk
///
/// Returns the path the daemon reported, taken as the last word of its
/// reply. The reply is not validated: an empty reply gives an empty path.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundTripProbe;

/// Last whitespace-separated token of a `write` reply
pub fn written_path(reply: &str) -> String {
    reply
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Probe for RoundTripProbe {
    type Output = String;

    fn name(&self) -> &'static str {
        "round-trip"
    }

    async fn run(&self, console: &mut dyn Console) -> Result<String> {
        let reply = console.enabled_command("write").await?;
        Ok(written_path(&reply))
    }
}

/// Confirms the console answers at all
#[derive(Debug, Default, Clone, Copy)]
pub struct LivenessProbe;

#[async_trait]
impl Probe for LivenessProbe {
    type Output = bool;

    fn name(&self) -> &'static str {
        "liveness"
    }

    async fn run(&self, console: &mut dyn Console) -> Result<bool> {
        console.command("help").await?;
        Ok(true)
    }
}
