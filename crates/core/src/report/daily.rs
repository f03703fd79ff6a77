use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::Stats;
use crate::error::AgentError;
use crate::metrics::cycles;
use crate::store::{Store, samples};
use crate::types::{Sample, days_before};

/// One UTC day of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub samples: usize,
    pub level: Stats,
    pub mean_temperature: f64,
    pub last_health: f64,
    pub last_health_estimated: bool,
    /// Half-cycles completed within the day. Runs spanning midnight are
    /// split, so the sum over days can undercount the whole-window estimate.
    pub half_cycles: u32,
}

/// Group `series` (oldest first) by UTC date. Days without samples are skipped.
pub fn rollup(series: &[Sample], cycle_threshold: u8) -> Vec<DailyRow> {
    series
        .chunk_by(|a, b| a.timestamp.date_naive() == b.timestamp.date_naive())
        .filter_map(|day| {
            let first = day.first()?;
            let last = day.last()?;
            let levels: Vec<u8> = day.iter().map(|s| s.level).collect();
            Some(DailyRow {
                date: first.timestamp.date_naive(),
                samples: day.len(),
                level: Stats::of(day.iter().map(|s| f64::from(s.level)))?,
                mean_temperature: Stats::of(day.iter().map(|s| s.temperature))?.mean,
                last_health: last.capacity_health,
                last_health_estimated: last.health_estimated,
                half_cycles: cycles::estimate(&levels, cycle_threshold).half_cycles,
            })
        })
        .collect()
}

/// Per-day rows for the last `days` days up to `now`.
pub async fn build(
    store: &Store,
    days: i64,
    now: DateTime<Utc>,
    cycle_threshold: u8,
) -> Result<Vec<DailyRow>, AgentError> {
    let from = days_before(now, days.max(1) - 1)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now);
    let series = samples::fetch_range(store.pool(), from, now + Duration::microseconds(1)).await?;
    Ok(rollup(&series, cycle_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChargeStatus;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, level: u8) -> Sample {
        Sample {
            timestamp: Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap(),
            level,
            capacity_health: 90.0 - f64::from(day),
            health_estimated: false,
            temperature: f64::from(hour),
            status: ChargeStatus::Unknown,
        }
    }

    #[test]
    fn empty_series_has_no_rows() {
        assert!(rollup(&[], 80).is_empty());
    }

    #[test]
    fn groups_by_utc_date() {
        let series = vec![
            at(1, 2, 10),
            at(1, 10, 95),
            at(1, 20, 12),
            at(3, 8, 60),
        ];
        let rows = rollup(&series, 80);
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(first.samples, 3);
        assert_eq!(first.level.min, 10.0);
        assert_eq!(first.level.max, 95.0);
        assert_eq!(first.mean_temperature, 32.0 / 3.0);
        assert_eq!(first.half_cycles, 2);
        assert_eq!(first.last_health, 89.0);

        let second = &rows[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(second.samples, 1);
        assert_eq!(second.half_cycles, 0);
    }

    #[tokio::test]
    async fn huge_day_count_does_not_overflow() {
        let store = Store::open_in_memory().await.unwrap();
        let s = at(2, 9, 40);
        samples::insert(store.pool(), &s).await.unwrap();

        let rows = build(&store, i64::MAX, s.timestamp, 80).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].samples, 1);
    }
}
