use std::sync::Mutex;
use std::time::Duration;

use super::{SensorError, run_tool};

/// Delivers user-facing notifications.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, content: &str) -> Result<(), SensorError>;
}

const TERMUX_NOTIFICATION: &str = "termux-notification";

/// Posts an Android notification through Termux:API.
#[derive(Debug, Clone)]
pub struct TermuxNotifier {
    timeout: Duration,
}

impl TermuxNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl Notifier for TermuxNotifier {
    async fn notify(&self, title: &str, content: &str) -> Result<(), SensorError> {
        run_tool(TERMUX_NOTIFICATION, &["-t", title, "-c", content], self.timeout).await?;
        Ok(())
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, content: &str) -> Result<(), SensorError> {
        tracing::info!(title, content, "notification");
        Ok(())
    }
}

/// Keeps every notification in memory. For tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, content: &str) -> Result<(), SensorError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((title.to_string(), content.to_string()));
        Ok(())
    }
}
