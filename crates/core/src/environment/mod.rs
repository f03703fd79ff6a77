//! Collaborators the monitor reads from and reports to: the battery status
//! tool, the capacity files and the notification tool.

pub mod capacity;
pub mod notify;
pub mod status;

use std::time::Duration;

pub use capacity::{CapacityReader, FixedCapacityReader, SysfsCapacityReader};
pub use notify::{LogNotifier, Notifier, RecordingNotifier, TermuxNotifier};
pub use status::{MockStatusReader, StatusReader, TermuxStatusReader};

/// Failure of an external tool or source.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        source: std::io::Error,
    },
    #[error("{command} timed out after {secs}s")]
    Timeout { command: &'static str, secs: u64 },
    #[error("{command} exited with code {code}: {stderr}")]
    Failed {
        command: &'static str,
        code: i32,
        stderr: String,
    },
    #[error("malformed status output: {0}")]
    Malformed(String),
    #[error("status source unavailable: {0}")]
    Unavailable(String),
}

/// Run `command args..` with a timeout and return its stdout.
pub(crate) async fn run_tool(
    command: &'static str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, SensorError> {
    let result = tokio::time::timeout(
        timeout,
        tokio::process::Command::new(command)
            .args(args)
            .kill_on_drop(true)
            .output(),
    )
    .await;

    match result {
        Ok(Ok(output)) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Ok(output)) => Err(SensorError::Failed {
            command,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr)
                .lines()
                .next()
                .map(str::trim)
                .unwrap_or("no output")
                .to_string(),
        }),
        Ok(Err(source)) => Err(SensorError::Spawn { command, source }),
        Err(_) => Err(SensorError::Timeout {
            command,
            secs: timeout.as_secs(),
        }),
    }
}
