use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::store::{Store, samples};
use crate::types::{ChargeStatus, Sample, decode_timestamp, encode_timestamp};

/// Output formats for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
        }
    }
}

/// One exported row. Field names are the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub timestamp: String,
    pub level: u8,
    pub capacity: f64,
    pub temp: f64,
    pub status: String,
}

impl From<&Sample> for CsvRow {
    fn from(s: &Sample) -> Self {
        Self {
            timestamp: encode_timestamp(&s.timestamp),
            level: s.level,
            capacity: s.capacity_health,
            temp: s.temperature,
            status: s.status.as_db_str().to_string(),
        }
    }
}

impl CsvRow {
    /// Parse back into a sample. The estimated flag is not exported, so it
    /// comes back false.
    pub fn to_sample(&self) -> Result<Sample, AgentError> {
        let timestamp = decode_timestamp(&self.timestamp)
            .map_err(|e| AgentError::CorruptRecord(format!("timestamp {:?}: {e}", self.timestamp)))?;
        let status = ChargeStatus::from_db(&self.status)
            .ok_or_else(|| AgentError::CorruptRecord(format!("status {:?}", self.status)))?;
        Ok(Sample {
            timestamp,
            level: self.level,
            capacity_health: self.capacity,
            health_estimated: false,
            temperature: self.temp,
            status,
        })
    }
}

/// Write `series` as CSV with a header row. Returns the number of rows.
pub fn write_csv<W: io::Write>(series: &[Sample], out: W) -> Result<usize, AgentError> {
    let mut writer = csv::Writer::from_writer(out);
    if series.is_empty() {
        writer.write_record(["timestamp", "level", "capacity", "temp", "status"])?;
    }
    for sample in series {
        writer.serialize(CsvRow::from(sample))?;
    }
    writer.flush()?;
    Ok(series.len())
}

/// Read rows written by [`write_csv`].
pub fn read_csv<R: io::Read>(input: R) -> Result<Vec<CsvRow>, AgentError> {
    csv::Reader::from_reader(input)
        .deserialize()
        .map(|row| row.map_err(AgentError::from))
        .collect()
}

/// Export every stored sample, oldest first.
pub async fn export<W: io::Write>(
    store: &Store,
    format: ExportFormat,
    out: W,
) -> Result<usize, AgentError> {
    let series = samples::fetch_all(store.pool()).await?;
    let written = match format {
        ExportFormat::Csv => write_csv(&series, out)?,
    };
    tracing::info!(rows = written, %format, "export complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Sample {
        Sample {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 8, 15, 0).unwrap(),
            level: 57,
            capacity_health: 91.62,
            health_estimated: false,
            temperature: 31.4,
            status: ChargeStatus::Discharging,
        }
    }

    #[test]
    fn header_and_row_layout() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[sample()], &mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamp,level,capacity,temp,status"));
        assert_eq!(
            lines.next(),
            Some("2024-03-09T08:15:00.000000Z,57,91.62,31.4,discharging")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_export_still_has_header() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[], &mut buf).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "timestamp,level,capacity,temp,status\n");
    }

    #[test]
    fn rows_parse_back() {
        let mut buf = Vec::new();
        write_csv(&[sample()], &mut buf).unwrap();
        let rows = read_csv(buf.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_sample().unwrap(), sample());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("png".parse::<ExportFormat>().is_err());
    }
}
