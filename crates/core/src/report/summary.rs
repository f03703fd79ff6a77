use chrono::{DateTime, Duration, Utc};

use super::Stats;
use crate::error::AgentError;
use crate::metrics::cycles::{self, CycleEstimate};
use crate::metrics::sparkline::{self, WINDOW};
use crate::store::{Store, samples};
use crate::types::{Sample, days_before};

/// Summary of the samples recorded in the last `days` days.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub days: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub samples: usize,
    pub first_sample: Option<DateTime<Utc>>,
    pub last_sample: Option<DateTime<Utc>>,
    pub level: Option<Stats>,
    pub temperature: Option<Stats>,
    /// First and last measured health. Estimated values are skipped.
    pub health_first: Option<f64>,
    pub health_last: Option<f64>,
    /// Samples whose health is the fallback value.
    pub estimated_health: usize,
    pub cycles: CycleEstimate,
    /// Ten most recent health values, most recent first.
    pub sparkline: String,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Change in health over the window, negative for degradation.
    pub fn health_change(&self) -> Option<f64> {
        Some(self.health_last? - self.health_first?)
    }
}

/// Summarize `window` (oldest first) covering `[from, to)`.
pub fn summarize(
    window: &[Sample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    cycle_threshold: u8,
) -> Report {
    let levels: Vec<u8> = window.iter().map(|s| s.level).collect();
    let recent_health: Vec<f64> = window
        .iter()
        .rev()
        .take(WINDOW)
        .map(|s| s.capacity_health)
        .collect();
    let mut measured = window.iter().filter(|s| !s.health_estimated);
    let first_measured = measured.next();
    let last_measured = measured.next_back().or(first_measured);

    Report {
        days: (to - from).num_days(),
        from,
        to,
        samples: window.len(),
        first_sample: window.first().map(|s| s.timestamp),
        last_sample: window.last().map(|s| s.timestamp),
        level: Stats::of(window.iter().map(|s| f64::from(s.level))),
        temperature: Stats::of(window.iter().map(|s| s.temperature)),
        health_first: first_measured.map(|s| s.capacity_health),
        health_last: last_measured.map(|s| s.capacity_health),
        estimated_health: window.iter().filter(|s| s.health_estimated).count(),
        cycles: cycles::estimate(&levels, cycle_threshold),
        sparkline: sparkline::render(&sparkline::sparkline(&recent_health)),
    }
}

/// Load the last `days` days up to `now` and summarize them.
pub async fn build(
    store: &Store,
    days: i64,
    now: DateTime<Utc>,
    cycle_threshold: u8,
) -> Result<Report, AgentError> {
    let from = days_before(now, days.max(0));
    // `to` is exclusive; include a sample stamped exactly `now`.
    let to = now + Duration::microseconds(1);
    let window = samples::fetch_range(store.pool(), from, to).await?;
    tracing::debug!(days, samples = window.len(), "report window loaded");
    let mut report = summarize(&window, from, to, cycle_threshold);
    report.days = days;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChargeStatus;
    use chrono::TimeZone;

    fn sample(minute: i64, level: u8, health: f64, estimated: bool) -> Sample {
        Sample {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            level,
            capacity_health: health,
            health_estimated: estimated,
            temperature: 30.0 + minute as f64,
            status: ChargeStatus::Discharging,
        }
    }

    #[test]
    fn empty_window_is_empty_report() {
        let to = Utc::now();
        let r = summarize(&[], to - Duration::days(30), to, 80);
        assert!(r.is_empty());
        assert_eq!(r.level, None);
        assert_eq!(r.health_change(), None);
        assert_eq!(r.cycles.cycles(), 0);
        assert_eq!(r.sparkline, "");
        assert_eq!(r.days, 30);
    }

    #[test]
    fn summarizes_levels_health_and_cycles() {
        let window = vec![
            sample(0, 10, 92.0, false),
            sample(1, 90, 91.5, false),
            sample(2, 10, 100.0, true),
            sample(3, 50, 91.0, false),
        ];
        let from = window[0].timestamp;
        let to = window[3].timestamp + Duration::minutes(1);
        let r = summarize(&window, from, to, 80);

        assert_eq!(r.samples, 4);
        let level = r.level.unwrap();
        assert_eq!((level.min, level.max, level.mean), (10.0, 90.0, 40.0));
        assert_eq!(r.temperature.unwrap().max, 33.0);
        assert_eq!(r.health_change(), Some(-1.0));
        assert_eq!(r.estimated_health, 1);
        assert_eq!(r.cycles.cycles(), 1);
        assert_eq!(r.sparkline.chars().count(), 4);
        // Most recent first: 91.0 is the window minimum.
        assert_eq!(r.sparkline.chars().next(), Some(' '));
    }

    #[test]
    fn estimated_health_is_left_out_of_the_change() {
        let window = vec![
            sample(0, 50, 100.0, true),
            sample(1, 48, 91.0, false),
            sample(2, 46, 90.5, false),
            sample(3, 44, 100.0, true),
        ];
        let r = summarize(&window, window[0].timestamp, window[3].timestamp, 80);
        assert_eq!(r.health_first, Some(91.0));
        assert_eq!(r.health_last, Some(90.5));
        assert_eq!(r.health_change(), Some(-0.5));
        assert_eq!(r.estimated_health, 2);
    }

    #[test]
    fn window_without_measurements_has_no_health_change() {
        let window = vec![sample(0, 50, 100.0, true), sample(1, 49, 100.0, true)];
        let r = summarize(&window, window[0].timestamp, window[1].timestamp, 80);
        assert_eq!(r.health_first, None);
        assert_eq!(r.health_change(), None);
    }

    #[tokio::test]
    async fn huge_window_reads_whole_history() {
        let store = Store::open_in_memory().await.unwrap();
        let s = sample(0, 50, 91.0, false);
        samples::insert(store.pool(), &s).await.unwrap();

        let r = build(&store, 100_000_000, s.timestamp + Duration::hours(1), 80)
            .await
            .unwrap();
        assert_eq!(r.samples, 1);
        assert_eq!(r.days, 100_000_000);
    }
}
