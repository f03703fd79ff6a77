//! Read-side views over the sample series: windowed summaries, per-day
//! rollups, battery age and CSV export. An empty series produces empty
//! results, never an error.

pub mod age;
pub mod daily;
pub mod export;
pub mod summary;

pub use age::AgeReport;
pub use daily::DailyRow;
pub use export::ExportFormat;
pub use summary::Report;

/// Min / max / mean of a set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Stats {
    /// None for an empty input.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}
