use chrono::{DateTime, Utc};

use crate::error::AgentError;
use crate::metrics::cycles::{self, CycleEstimate};
use crate::store::{Store, samples};
use crate::types::Sample;

/// Health level treated as end of useful life.
pub const END_OF_LIFE_HEALTH: f64 = 80.0;

/// Minimum span of measured health before a wear rate is reported.
const MIN_WEAR_SPAN_DAYS: f64 = 1.0;

/// Long-run view of the battery: how long it has been tracked, lifetime
/// cycles and wear projected from measured health.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeReport {
    pub first_sample: Option<DateTime<Utc>>,
    pub days_tracked: i64,
    pub samples: usize,
    pub lifetime_cycles: CycleEstimate,
    pub latest_measured_health: Option<f64>,
    /// Health points lost per 30 days, first to latest measured value.
    pub wear_per_30_days: Option<f64>,
    /// Days until health reaches [`END_OF_LIFE_HEALTH`] at the current wear
    /// rate; 0 when already there, None when health is not declining.
    pub days_to_end_of_life: Option<i64>,
}

/// Assess the whole `series` (oldest first).
pub fn assess(series: &[Sample], now: DateTime<Utc>, cycle_threshold: u8) -> AgeReport {
    let levels: Vec<u8> = series.iter().map(|s| s.level).collect();
    let first_sample = series.first().map(|s| s.timestamp);

    let mut measured = series.iter().filter(|s| !s.health_estimated);
    let first_measured = measured.next();
    let last_measured = measured.next_back().or(first_measured);

    let wear_per_day = match (first_measured, last_measured) {
        (Some(a), Some(b)) => {
            let span_days = (b.timestamp - a.timestamp).num_seconds() as f64 / 86_400.0;
            (span_days >= MIN_WEAR_SPAN_DAYS)
                .then(|| (a.capacity_health - b.capacity_health) / span_days)
        }
        _ => None,
    };

    let latest_measured_health = last_measured.map(|s| s.capacity_health);
    let days_to_end_of_life = match (latest_measured_health, wear_per_day) {
        (Some(h), _) if h <= END_OF_LIFE_HEALTH => Some(0),
        (Some(h), Some(rate)) if rate > 0.0 => {
            Some(((h - END_OF_LIFE_HEALTH) / rate).ceil() as i64)
        }
        _ => None,
    };

    AgeReport {
        first_sample,
        days_tracked: first_sample.map_or(0, |t| (now - t).num_days().max(0)),
        samples: series.len(),
        lifetime_cycles: cycles::estimate(&levels, cycle_threshold),
        latest_measured_health,
        wear_per_30_days: wear_per_day.map(|r| r * 30.0),
        days_to_end_of_life,
    }
}

pub async fn build(
    store: &Store,
    now: DateTime<Utc>,
    cycle_threshold: u8,
) -> Result<AgeReport, AgentError> {
    let series = samples::fetch_all(store.pool()).await?;
    Ok(assess(&series, now, cycle_threshold))
}
