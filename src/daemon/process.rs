//! Daemon launching and teardown
//!
//! A daemon under test is started as `<executable> -c <config>` with all of
//! its standard streams on the null device. Talking to it happens over the
//! VTY socket only.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::common::{Error, Result};

/// An owned, running daemon child process
///
/// Callers must [`terminate`](DaemonProcess::terminate) it before moving on;
/// dropping it without doing so still kills the child but does not reap it.
pub struct DaemonProcess {
    child: Child,
    command_line: String,
    pid: Option<u32>,
    exit_status: Option<ExitStatus>,
}

impl DaemonProcess {
    /// Start `executable -c config`
    pub fn launch(executable: &Path, config: &Path) -> Result<Self> {
        let command_line = format!("{} -c {}", executable.display(), config.display());

        let child = Command::new(executable)
            .arg("-c")
            .arg(config)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Launch {
                command: command_line.clone(),
                source,
            })?;

        let pid = child.id();
        tracing::debug!(?pid, "Launched {}", command_line);

        Ok(Self {
            child,
            command_line,
            pid,
            exit_status: None,
        })
    }

    /// OS process id, as seen right after launch
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The command line used to start the daemon, for diagnostics
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Exit status if the daemon has already exited, without blocking
    pub fn try_exit_status(&mut self) -> Result<Option<ExitStatus>> {
        if self.exit_status.is_none() {
            self.exit_status = self.child.try_wait()?;
        }
        Ok(self.exit_status)
    }

    /// Kill the daemon and wait until it has been reaped
    ///
    /// Safe to call on a daemon that already exited, and more than once.
    pub async fn terminate(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.try_exit_status()? {
            return Ok(status);
        }

        if let Err(e) = self.child.start_kill() {
            // Raced with the daemon exiting on its own
            if e.kind() != io::ErrorKind::InvalidInput {
                return Err(e.into());
            }
        }

        let status = self.child.wait().await?;
        tracing::debug!(pid = ?self.pid, %status, "Terminated {}", self.command_line);
        self.exit_status = Some(status);
        Ok(status)
    }
}

/// Terminate `process` if there is one
pub async fn terminate(process: Option<&mut DaemonProcess>) -> Result<()> {
    if let Some(process) = process {
        process.terminate().await?;
    }
    Ok(())
}

/// Locate a daemon executable
///
/// Paths that exist are used as-is; bare names are looked up in `PATH`.
/// Returns `None` when the daemon was not built or installed.
pub fn resolve_executable(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    if path.components().count() == 1 {
        return which::which(path).ok();
    }
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // `sh -c <config>` runs the "config path" as a script, which makes the
    // launcher easy to exercise without a real daemon.

    #[tokio::test]
    async fn test_launch_missing_executable() {
        let err = DaemonProcess::launch(
            Path::new("/nonexistent/osmo-bsc"),
            Path::new("bsc.cfg"),
        )
        .err()
        .expect("launch must fail");

        match err {
            Error::Launch { command, source } => {
                assert_eq!(command, "/nonexistent/osmo-bsc -c bsc.cfg");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_terminate_running_process() {
        let mut process = DaemonProcess::launch(Path::new("sh"), Path::new("sleep 30")).unwrap();
        assert!(process.pid().is_some());
        assert!(process.try_exit_status().unwrap().is_none());

        let status = process.terminate().await.unwrap();
        assert!(!status.success());

        // Second call is a no-op returning the same status
        let again = process.terminate().await.unwrap();
        assert_eq!(status, again);
    }

    #[tokio::test]
    async fn test_terminate_already_exited_process() {
        let mut process = DaemonProcess::launch(Path::new("sh"), Path::new("exit 3")).unwrap();
        for _ in 0..100 {
            if process.try_exit_status().unwrap().is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        let status = process.terminate().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_terminate_none_is_noop() {
        assert!(terminate(None).await.is_ok());
    }

    #[test]
    fn test_resolve_executable() {
        assert!(resolve_executable(Path::new("sh")).is_some());
        assert!(resolve_executable(Path::new("./definitely-not-built/osmo-nitb")).is_none());
        assert!(resolve_executable(Path::new("definitely-not-installed-daemon")).is_none());
    }
}
