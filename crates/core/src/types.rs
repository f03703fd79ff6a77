use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Charging state as reported by the battery status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    Unknown,
}

impl ChargeStatus {
    /// Parse from DB string representation.
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "charging" => Some(Self::Charging),
            "discharging" => Some(Self::Discharging),
            "full" => Some(Self::Full),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Convert to DB string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Discharging => "discharging",
            Self::Full => "full",
            Self::Unknown => "unknown",
        }
    }

    /// Map the upper-case status printed by `termux-battery-status`.
    /// `NOT_CHARGING` (plugged in but held) has no counterpart and maps to `Unknown`.
    pub fn from_reported(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHARGING" => Self::Charging,
            "DISCHARGING" => Self::Discharging,
            "FULL" => Self::Full,
            _ => Self::Unknown,
        }
    }
}

/// Power source the device is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlugState {
    Ac,
    Usb,
    Wireless,
    Unplugged,
    Unknown,
}

impl PlugState {
    pub fn from_reported(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLUGGED_AC" => Self::Ac,
            "PLUGGED_USB" => Self::Usb,
            "PLUGGED_WIRELESS" => Self::Wireless,
            "UNPLUGGED" => Self::Unplugged,
            _ => Self::Unknown,
        }
    }
}

/// One reading from the battery status source, taken at call time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    /// Charge level, 0–100.
    pub percentage: u8,
    /// Battery temperature in °C.
    pub temperature: f64,
    pub plugged: PlugState,
    pub status: ChargeStatus,
}

/// Design and current full-charge capacity, in mAh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityReading {
    pub design_mah: f64,
    pub current_mah: f64,
}

/// Capacity health percentage, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthReading {
    /// Computed from a capacity reading.
    Measured(f64),
    /// Capacity was unreadable; the value is the fixed fallback.
    Estimated(f64),
}

impl HealthReading {
    pub fn value(self) -> f64 {
        match self {
            Self::Measured(v) | Self::Estimated(v) => v,
        }
    }

    pub fn is_estimated(self) -> bool {
        matches!(self, Self::Estimated(_))
    }
}

/// One persisted battery reading. Keyed by `timestamp`; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub level: u8,
    pub capacity_health: f64,
    /// True when `capacity_health` is the fallback rather than a measurement.
    pub health_estimated: bool,
    pub temperature: f64,
    pub status: ChargeStatus,
}

impl Sample {
    /// Build a sample from a status reading. The timestamp is truncated to
    /// microseconds, the precision the store keeps.
    pub fn new(timestamp: DateTime<Utc>, status: &BatteryStatus, health: HealthReading) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            level: status.percentage,
            capacity_health: health.value(),
            health_estimated: health.is_estimated(),
            temperature: status.temperature,
            status: status.status,
        }
    }

    pub fn health(&self) -> HealthReading {
        if self.health_estimated {
            HealthReading::Estimated(self.capacity_health)
        } else {
            HealthReading::Measured(self.capacity_health)
        }
    }
}

/// A confirmed full discharge/charge calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationEvent {
    pub timestamp: DateTime<Utc>,
}

impl CalibrationEvent {
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp: timestamp.trunc_subsecs(6) }
    }
}

// ── Timestamp encoding ─────────────────────────────────────────

/// Fixed-width ISO-8601 UTC with microseconds. Text order equals time order.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// `ts` minus `days` whole days, saturating at the earliest representable
/// instant instead of overflowing.
pub fn days_before(ts: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|d| ts.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ── Runtime snapshot ───────────────────────────────────────────

/// Snapshot of monitor state, broadcast after every tick via watch channel.
#[derive(Debug, Clone, Default)]
pub struct MonitorStatus {
    pub tick_count: u64,
    pub last_sample: Option<Sample>,
    pub plugged: Option<PlugState>,
    /// None until the first successful derivation.
    pub cycles: Option<u32>,
    pub sparkline: String,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn charge_status_db_roundtrip() {
        let cases = [
            (ChargeStatus::Charging, "charging"),
            (ChargeStatus::Discharging, "discharging"),
            (ChargeStatus::Full, "full"),
            (ChargeStatus::Unknown, "unknown"),
        ];
        for (status, expected) in &cases {
            assert_eq!(status.as_db_str(), *expected);
            assert_eq!(ChargeStatus::from_db(expected), Some(*status));
        }
        assert_eq!(ChargeStatus::from_db("CHARGING"), None);
    }

    #[test]
    fn reported_strings_map_to_enums() {
        assert_eq!(ChargeStatus::from_reported("CHARGING"), ChargeStatus::Charging);
        assert_eq!(ChargeStatus::from_reported("discharging"), ChargeStatus::Discharging);
        assert_eq!(ChargeStatus::from_reported("NOT_CHARGING"), ChargeStatus::Unknown);
        assert_eq!(PlugState::from_reported("PLUGGED_AC"), PlugState::Ac);
        assert_eq!(PlugState::from_reported("UNPLUGGED"), PlugState::Unplugged);
        assert_eq!(PlugState::from_reported("???"), PlugState::Unknown);
    }

    #[test]
    fn timestamp_encoding_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1_500_250);
        let (ea, eb) = (encode_timestamp(&a), encode_timestamp(&b));
        assert_eq!(ea, "2024-03-01T09:05:00.000000Z");
        assert_eq!(eb, "2024-03-01T09:05:01.500250Z");
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
        assert_eq!(decode_timestamp(&eb).unwrap(), b);
    }

    #[test]
    fn sample_truncates_to_microseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_567);
        let status = BatteryStatus {
            percentage: 55,
            temperature: 31.5,
            plugged: PlugState::Unplugged,
            status: ChargeStatus::Discharging,
        };
        let sample = Sample::new(ts, &status, HealthReading::Estimated(100.0));
        assert_eq!(sample.timestamp.timestamp_subsec_nanos(), 1_234_000);
        assert!(sample.health_estimated);
        assert_eq!(sample.health(), HealthReading::Estimated(100.0));
    }

    #[test]
    fn days_before_saturates() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(days_before(ts, 9), Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(days_before(ts, 100_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(days_before(ts, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
