//! Calibration schedule.
//!
//! A calibration is a full charge, a full discharge and a full recharge done
//! by the operator. Passive monitoring cannot tell that one happened, so the
//! workflow is manual and two-step: `calibrate` to get instructions (or to log
//! a due calibration), then `calibrate --confirm` once the cycle is complete.

use chrono::{DateTime, Utc};

use crate::error::AgentError;
use crate::store::{Store, calibration};
use crate::types::CalibrationEvent;

pub const INSTRUCTIONS: &[&str] = &[
    "Starting calibration cycle. This will take a long time.",
    "1. Charge the device to 100% and leave it plugged in for another hour.",
    "2. Unplug and use it normally until it shuts down at 0%.",
    "3. Charge it back to 100% without interruption.",
    "When done, run `battery-doctor calibrate --confirm` to record it.",
];

/// Where the schedule stands relative to the last recorded calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    NeverCalibrated,
    Due { last: DateTime<Utc>, days_since: i64 },
    Pending { last: DateTime<Utc>, days_remaining: i64 },
}

/// Result of a `calibrate` or `confirm` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// No calibration on record. Nothing was written.
    Instructions,
    /// A calibration event was written.
    Recorded(CalibrationEvent),
    /// Last calibration is recent. Nothing was written.
    NotDue { days_remaining: i64 },
}

/// Classify `last` against `now`. Whole elapsed days count, so 29.9 days is 29.
pub fn evaluate(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval_days: i64,
) -> CalibrationState {
    let Some(last) = last else {
        return CalibrationState::NeverCalibrated;
    };
    let days_since = (now - last).num_days().max(0);
    if days_since >= interval_days {
        CalibrationState::Due { last, days_since }
    } else {
        CalibrationState::Pending {
            last,
            days_remaining: interval_days - days_since,
        }
    }
}

/// Calibration workflow over the store's `calibration` table.
#[derive(Debug)]
pub struct CalibrationScheduler<'a> {
    store: &'a Store,
    interval_days: i64,
}

impl<'a> CalibrationScheduler<'a> {
    pub fn new(store: &'a Store, interval_days: i64) -> Self {
        Self {
            store,
            interval_days,
        }
    }

    pub async fn state(&self, now: DateTime<Utc>) -> Result<CalibrationState, AgentError> {
        let last = calibration::latest(self.store.pool()).await?;
        Ok(evaluate(last.map(|e| e.timestamp), now, self.interval_days))
    }

    /// First step. Records an event only when one is due.
    pub async fn calibrate(&self, now: DateTime<Utc>) -> Result<CalibrationOutcome, AgentError> {
        match self.state(now).await? {
            CalibrationState::NeverCalibrated => Ok(CalibrationOutcome::Instructions),
            CalibrationState::Due { days_since, .. } => {
                tracing::info!(days_since, "calibration due, recording");
                self.record(now).await
            }
            CalibrationState::Pending { days_remaining, .. } => {
                Ok(CalibrationOutcome::NotDue { days_remaining })
            }
        }
    }

    /// Second step: the operator confirms a completed cycle. Records unless
    /// the last calibration is still recent.
    pub async fn confirm(&self, now: DateTime<Utc>) -> Result<CalibrationOutcome, AgentError> {
        match self.state(now).await? {
            CalibrationState::NeverCalibrated | CalibrationState::Due { .. } => self.record(now).await,
            CalibrationState::Pending { days_remaining, .. } => {
                Ok(CalibrationOutcome::NotDue { days_remaining })
            }
        }
    }

    async fn record(&self, now: DateTime<Utc>) -> Result<CalibrationOutcome, AgentError> {
        let event = CalibrationEvent::at(now);
        calibration::insert(self.store.pool(), &event).await?;
        Ok(CalibrationOutcome::Recorded(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_event_is_never_calibrated() {
        assert_eq!(evaluate(None, now(), 30), CalibrationState::NeverCalibrated);
    }

    #[test]
    fn recent_event_is_pending_with_days_remaining() {
        let last = now() - Duration::days(10);
        assert_eq!(
            evaluate(Some(last), now(), 30),
            CalibrationState::Pending { last, days_remaining: 20 }
        );
    }

    #[test]
    fn partial_days_round_down() {
        let last = now() - Duration::days(29) - Duration::hours(23);
        assert!(matches!(
            evaluate(Some(last), now(), 30),
            CalibrationState::Pending { days_remaining: 1, .. }
        ));
    }

    #[test]
    fn boundary_is_due() {
        let last = now() - Duration::days(30);
        assert!(matches!(
            evaluate(Some(last), now(), 30),
            CalibrationState::Due { days_since: 30, .. }
        ));
    }

    #[test]
    fn future_event_counts_as_today() {
        let last = now() + Duration::days(2);
        assert!(matches!(
            evaluate(Some(last), now(), 30),
            CalibrationState::Pending { days_remaining: 30, .. }
        ));
    }
}
