use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

use super::{SensorError, run_tool};
use crate::types::{BatteryStatus, ChargeStatus, PlugState};

/// Source of the instantaneous battery state.
#[async_trait::async_trait]
pub trait StatusReader: Send + Sync {
    fn name(&self) -> &str;
    async fn read_status(&self) -> Result<BatteryStatus, SensorError>;
}

// ── Termux ─────────────────────────────────────────────────────

const TERMUX_STATUS: &str = "termux-battery-status";

/// Shape of `termux-battery-status` JSON. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct TermuxBattery {
    percentage: i64,
    temperature: f64,
    plugged: String,
    status: String,
}

/// Parse the JSON printed by `termux-battery-status`.
pub fn parse_termux_status(json: &str) -> Result<BatteryStatus, SensorError> {
    let raw: TermuxBattery =
        serde_json::from_str(json).map_err(|e| SensorError::Malformed(e.to_string()))?;
    let percentage = u8::try_from(raw.percentage)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| SensorError::Malformed(format!("percentage out of range: {}", raw.percentage)))?;
    Ok(BatteryStatus {
        percentage,
        temperature: raw.temperature,
        plugged: PlugState::from_reported(&raw.plugged),
        status: ChargeStatus::from_reported(&raw.status),
    })
}

/// Reads battery state through the Termux:API command-line tool.
#[derive(Debug, Clone)]
pub struct TermuxStatusReader {
    timeout: Duration,
}

impl TermuxStatusReader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl StatusReader for TermuxStatusReader {
    fn name(&self) -> &str {
        TERMUX_STATUS
    }

    async fn read_status(&self) -> Result<BatteryStatus, SensorError> {
        let stdout = run_tool(TERMUX_STATUS, &[], self.timeout).await?;
        parse_termux_status(&stdout)
    }
}

// ── Mock ───────────────────────────────────────────────────────

/// Scripted reader for tests: returns queued results in order, then
/// `Unavailable` once the script runs out.
#[derive(Debug, Default)]
pub struct MockStatusReader {
    script: Mutex<VecDeque<Result<BatteryStatus, String>>>,
}

impl MockStatusReader {
    pub fn new(script: impl IntoIterator<Item = Result<BatteryStatus, String>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    /// Reader that always returns the same status `n` times.
    pub fn repeat(status: BatteryStatus, n: usize) -> Self {
        Self::new(std::iter::repeat_n(Ok(status), n))
    }
}

#[async_trait::async_trait]
impl StatusReader for MockStatusReader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read_status(&self) -> Result<BatteryStatus, SensorError> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err(msg)) => Err(SensorError::Unavailable(msg)),
            None => Err(SensorError::Unavailable("mock script exhausted".into())),
        }
    }
}
