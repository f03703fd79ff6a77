use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;

use crate::store::settings;

/// Ceiling for every day-count setting and argument, about a century.
pub const MAX_DAYS: i64 = 36_500;

/// Agent tunables. Loaded from the `config` table at startup.
///
/// The table only holds operator overrides: a missing or unparsable entry
/// falls back to the compiled default, and unknown keys are left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCfg {
    // monitor loop
    pub tick_secs: u64,
    pub status_timeout_secs: u64,

    // charge alert
    pub alert_level_pct: u8,
    pub alert_repeat: bool,

    // derivation
    pub cycle_run_threshold: u8,

    // calibration
    pub calibration_interval_days: i64,

    // retention, 0 keeps every sample
    pub retention_days: i64,

    // capacity source
    pub power_supply_dir: String,
}

impl Default for AgentCfg {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            status_timeout_secs: 10,
            alert_level_pct: 80,
            alert_repeat: false,
            cycle_run_threshold: 80,
            calibration_interval_days: 30,
            retention_days: 0,
            power_supply_dir: "/sys/class/power_supply/battery".to_string(),
        }
    }
}

impl AgentCfg {
    /// Load overrides from the `config` table on top of the defaults.
    pub async fn load(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let rows = settings::list(pool).await?;
        let map: HashMap<String, String> = rows.into_iter().collect();
        Ok(Self::from_map(&map))
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            tick_secs: get_or(m, "tick_secs", d.tick_secs).max(1),
            status_timeout_secs: get_or(m, "status_timeout_secs", d.status_timeout_secs).max(1),
            alert_level_pct: get_or(m, "alert_level_pct", d.alert_level_pct).min(100),
            alert_repeat: get_or(m, "alert_repeat", d.alert_repeat),
            cycle_run_threshold: get_or(m, "cycle_run_threshold", d.cycle_run_threshold),
            calibration_interval_days: get_or(m, "calibration_interval_days", d.calibration_interval_days)
                .clamp(0, MAX_DAYS),
            retention_days: get_or(m, "retention_days", d.retention_days).clamp(0, MAX_DAYS),
            power_supply_dir: m.get("power_supply_dir").cloned().unwrap_or(d.power_supply_dir),
        }
    }

    /// Effective values with a short description, for `config list`.
    pub fn entries(&self) -> Vec<(&'static str, String, &'static str)> {
        vec![
            ("tick_secs", self.tick_secs.to_string(), "Seconds between monitor ticks"),
            ("status_timeout_secs", self.status_timeout_secs.to_string(), "Timeout for one status read"),
            ("alert_level_pct", self.alert_level_pct.to_string(), "Charge level that triggers the AC alert"),
            ("alert_repeat", self.alert_repeat.to_string(), "Re-notify on every tick above the alert level"),
            ("cycle_run_threshold", self.cycle_run_threshold.to_string(), "Level swing counted as half a cycle"),
            ("calibration_interval_days", self.calibration_interval_days.to_string(), "Days between calibrations"),
            ("retention_days", self.retention_days.to_string(), "Prune samples older than this, 0 keeps all"),
            ("power_supply_dir", self.power_supply_dir.clone(), "Directory holding charge_full files"),
        ]
    }

    /// Check that `value` parses for a known `key`. Unknown keys are accepted.
    pub fn validate(key: &str, value: &str) -> Result<(), String> {
        let ok = match key {
            "tick_secs" | "status_timeout_secs" => value.parse::<u64>().is_ok(),
            "alert_level_pct" | "cycle_run_threshold" => value.parse::<u8>().is_ok_and(|v| v <= 100),
            "alert_repeat" => value.parse::<bool>().is_ok(),
            "calibration_interval_days" | "retention_days" => value
                .parse::<i64>()
                .is_ok_and(|v| (0..=MAX_DAYS).contains(&v)),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("invalid value {value:?} for {key}"))
        }
    }

    pub fn is_known_key(key: &str) -> bool {
        Self::default().entries().iter().any(|(k, _, _)| *k == key)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_map_gives_defaults() {
        assert_eq!(AgentCfg::from_map(&HashMap::new()), AgentCfg::default());
    }

    #[test]
    fn overrides_apply_and_garbage_falls_back() {
        let cfg = AgentCfg::from_map(&map(&[
            ("tick_secs", "15"),
            ("alert_repeat", "true"),
            ("alert_level_pct", "not-a-number"),
            ("some_future_key", "x"),
        ]));
        assert_eq!(cfg.tick_secs, 15);
        assert!(cfg.alert_repeat);
        assert_eq!(cfg.alert_level_pct, 80);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(15));
    }

    #[test]
    fn zero_tick_is_raised_to_one_second() {
        let cfg = AgentCfg::from_map(&map(&[("tick_secs", "0")]));
        assert_eq!(cfg.tick_secs, 1);
    }

    #[test]
    fn validate_known_and_unknown_keys() {
        assert!(AgentCfg::validate("tick_secs", "30").is_ok());
        assert!(AgentCfg::validate("tick_secs", "-3").is_err());
        assert!(AgentCfg::validate("alert_level_pct", "101").is_err());
        assert!(AgentCfg::validate("alert_repeat", "yes").is_err());
        assert!(AgentCfg::validate("anything_else", "whatever").is_ok());
        assert!(AgentCfg::is_known_key("retention_days"));
        assert!(!AgentCfg::is_known_key("anything_else"));
    }

    #[test]
    fn day_counts_are_capped() {
        assert!(AgentCfg::validate("retention_days", "36500").is_ok());
        assert!(AgentCfg::validate("retention_days", "100000000").is_err());
        assert!(AgentCfg::validate("calibration_interval_days", "36501").is_err());

        let cfg = AgentCfg::from_map(&map(&[
            ("retention_days", "100000000"),
            ("calibration_interval_days", "-5"),
        ]));
        assert_eq!(cfg.retention_days, MAX_DAYS);
        assert_eq!(cfg.calibration_interval_days, 0);
    }
}
