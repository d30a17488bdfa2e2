//! Single-config test driver
//!
//! Drives one (app, config) pair through every probe. Each probe gets a
//! fresh daemon: launch, wait for the console, connect, probe, terminate.
//! The daemon is terminated on every path out of a probe, error or not.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::daemon::DaemonProcess;
use crate::vty::{Prompt, VtyClient};

use super::descriptor::AppDescriptor;
use super::probes::{DocumentationProbe, LivenessProbe, Probe, RoundTripProbe};
use super::report::ConfigReport;

/// Runs the probe sequence for configs of one app
pub struct ConfigTest<'a> {
    app: &'a AppDescriptor,
    executable: PathBuf,
    settings: &'a Config,
    scratch_dir: &'a Path,
    verbose: bool,
}

impl<'a> ConfigTest<'a> {
    pub fn new(
        app: &'a AppDescriptor,
        executable: PathBuf,
        settings: &'a Config,
        scratch_dir: &'a Path,
        verbose: bool,
    ) -> Self {
        Self {
            app,
            executable,
            settings,
            scratch_dir,
            verbose,
        }
    }

    fn host(&self) -> &str {
        self.app
            .host
            .as_deref()
            .unwrap_or(&self.settings.console.host)
    }

    /// Test one config
    ///
    /// Console failures end up in the returned report. Only a daemon that
    /// cannot be started at all is returned as an error.
    pub async fn run(&self, config: &Path) -> Result<ConfigReport> {
        let mut report = ConfigReport::new(&self.app.name, config.to_path_buf());

        match self.run_probes(config, &mut report).await {
            Ok(()) => Ok(report),
            Err(e @ Error::Launch { .. }) => Err(e),
            Err(e) => {
                report.failure = Some(e.to_string());
                Ok(report)
            }
        }
    }

    async fn run_probes(&self, config: &Path, report: &mut ConfigReport) -> Result<()> {
        // Documentation runs against the untouched sample
        let docs = self.run_probe(config, &DocumentationProbe).await?;
        report.doc_findings = docs.count();

        // The rest may make the daemon rewrite its config file
        let copy = paths::copy_config(self.scratch_dir, config)?;

        let written = self.run_probe(&copy, &RoundTripProbe).await?;
        if written.is_empty() || !Path::new(&written).exists() {
            tracing::warn!(
                "{}: write reported '{}', which is not an existing file",
                config.display(),
                written
            );
        }
        report.written_config = Some(written);

        self.run_probe(&copy, &LivenessProbe).await?;
        Ok(())
    }

    /// Launch a daemon with `config`, run `probe` on its console, tear down
    pub async fn run_probe<P: Probe>(&self, config: &Path, probe: &P) -> Result<P::Output> {
        let mut process = DaemonProcess::launch(&self.executable, config)?;
        if self.verbose {
            tracing::info!("Verifying {}, test {}", process.command_line(), probe.name());
        }

        let result = self.probe_process(&mut process, probe).await;

        if let Err(e) = process.terminate().await {
            tracing::warn!("Failed to stop {}: {}", process.command_line(), e);
        }

        result.map_err(|e| {
            tracing::error!("Failed to verify {}", process.command_line());
            tracing::error!("Error was {}", e);
            Error::ConfigTest {
                command: process.command_line().to_string(),
                probe: probe.name().to_string(),
                source: Box::new(e),
            }
        })
    }

    async fn probe_process<P: Probe>(
        &self,
        process: &mut DaemonProcess,
        probe: &P,
    ) -> Result<P::Output> {
        let mut client = self.wait_for_console(process).await?;
        probe.run(&mut client).await
    }

    /// Poll the console until it accepts a session
    ///
    /// Waits the settle delay first, then retries with exponential backoff
    /// until the connect timeout runs out or the daemon dies.
    async fn wait_for_console(&self, process: &mut DaemonProcess) -> Result<VtyClient> {
        let timeouts = &self.settings.timeouts;
        let prompt = Prompt::new(&self.app.prompt)?;
        let deadline = Instant::now() + timeouts.connect();
        let mut delay = timeouts.poll_initial();

        tokio::time::sleep(timeouts.settle()).await;

        loop {
            if let Some(status) = process.try_exit_status()? {
                return Err(Error::DaemonExited {
                    command: process.command_line().to_string(),
                    status: status.to_string(),
                });
            }

            match VtyClient::connect(self.host(), self.app.port, prompt.clone(), timeouts.command())
                .await
            {
                Ok(client) => return Ok(client),
                Err(e) if console_not_ready(&e) => {
                    if Instant::now() + delay >= deadline {
                        tracing::debug!("Giving up on {}:{}: {}", self.host(), self.app.port, e);
                        return Err(Error::timeout(
                            &format!("console at {}:{}", self.host(), self.app.port),
                            timeouts.connect(),
                        ));
                    }
                    tracing::trace!("Console not up yet: {}", e);
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(timeouts.poll_max());
        }
    }
}

/// Errors that mean the console is not accepting sessions yet
///
/// Refused, reset or closed during the banner are all retried.
fn console_not_ready(error: &Error) -> bool {
    matches!(
        error,
        Error::ConnectionFailed { .. } | Error::ConnectionClosed | Error::Io(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_console_not_ready() {
        let refused = Error::connection_failed(
            "127.0.0.1",
            4242,
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(console_not_ready(&refused));
        assert!(console_not_ready(&Error::ConnectionClosed));
        assert!(console_not_ready(&Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset by peer"
        ))));

        assert!(!console_not_ready(&Error::timeout(
            "console banner",
            Duration::from_secs(1)
        )));
        assert!(!console_not_ready(&Error::Protocol("garbage".to_string())));
        assert!(!console_not_ready(&Error::DaemonExited {
            command: "osmo-bsc -c bsc.cfg".to_string(),
            status: "exit status: 1".to_string(),
        }));
    }
}
