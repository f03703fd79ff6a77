//! Plain-text output for every command. Functions return strings so the
//! caller decides where they go.

use std::fmt::Write;

use battery_doctor_core::calibration::{CalibrationOutcome, INSTRUCTIONS};
use battery_doctor_core::report::{AgeReport, DailyRow, Report};
use battery_doctor_core::types::{MonitorStatus, PlugState, Sample};

const TEMP_HOT_C: f64 = 40.0;
const TEMP_WARM_C: f64 = 35.0;

/// Red above 40 °C, yellow above 35 °C, green otherwise.
pub fn temp_indicator(celsius: f64) -> &'static str {
    if celsius > TEMP_HOT_C {
        "🔴"
    } else if celsius > TEMP_WARM_C {
        "🟡"
    } else {
        "🟢"
    }
}

pub fn plug_label(plugged: PlugState) -> &'static str {
    match plugged {
        PlugState::Ac => "AC",
        PlugState::Usb => "USB",
        PlugState::Wireless => "wireless",
        PlugState::Unplugged => "unplugged",
        PlugState::Unknown => "unknown",
    }
}

pub fn health_label(sample: &Sample) -> String {
    if sample.health_estimated {
        format!("{:.1}% (estimated)", sample.capacity_health)
    } else {
        format!("{:.1}%", sample.capacity_health)
    }
}

/// One line per tick for `monitor --plain`.
pub fn status_line(status: &MonitorStatus) -> String {
    let Some(sample) = &status.last_sample else {
        return match &status.last_error {
            Some(e) => format!("#{} no sample: {e}", status.tick_count),
            None => format!("#{} waiting for first sample", status.tick_count),
        };
    };
    let mut line = format!(
        "#{} {} level {}% | {} {:.1}°C | {} | health {} | cycles {} | [{}]",
        status.tick_count,
        sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
        sample.level,
        temp_indicator(sample.temperature),
        sample.temperature,
        status.plugged.map_or("unknown", plug_label),
        health_label(sample),
        status.cycles.map_or_else(|| "?".to_string(), |c| c.to_string()),
        status.sparkline,
    );
    if status.consecutive_failures > 0
        && let Some(e) = &status.last_error
    {
        let _ = write!(line, " | last tick failed: {e}");
    }
    line
}

pub fn calibration(outcome: &CalibrationOutcome) -> String {
    match outcome {
        CalibrationOutcome::Instructions => INSTRUCTIONS.join("\n"),
        CalibrationOutcome::Recorded(event) => format!(
            "Calibration recorded at {}.",
            event.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        CalibrationOutcome::NotDue { days_remaining } => {
            format!("Calibration not needed yet. Next in {days_remaining} days.")
        }
    }
}

pub fn report(r: &Report) -> String {
    let mut out = format!("Battery report, last {} days\n", r.days);
    if r.is_empty() {
        out.push_str("No samples recorded in this period.\n");
        return out;
    }
    if let (Some(first), Some(last)) = (r.first_sample, r.last_sample) {
        let _ = writeln!(
            out,
            "Samples:      {} ({} to {})",
            r.samples,
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }
    if let Some(level) = r.level {
        let _ = writeln!(
            out,
            "Level:        min {:.0}%  max {:.0}%  mean {:.1}%",
            level.min, level.max, level.mean
        );
    }
    if let Some(temp) = r.temperature {
        let _ = writeln!(
            out,
            "Temperature:  mean {:.1}°C  max {:.1}°C {}",
            temp.mean,
            temp.max,
            temp_indicator(temp.max)
        );
    }
    match (r.health_first, r.health_last, r.health_change()) {
        (Some(first), Some(last), Some(change)) => {
            let _ = writeln!(out, "Health:       {first:.1}% → {last:.1}% ({change:+.1})");
        }
        _ => out.push_str("Health:       unknown (no measured samples)\n"),
    }
    if r.estimated_health > 0 {
        let _ = writeln!(
            out,
            "              {} of {} health values are estimates (capacity unreadable)",
            r.estimated_health, r.samples
        );
    }
    let _ = writeln!(out, "Cycles:       {}", r.cycles.cycles());
    let _ = writeln!(out, "Recent health [{}]", r.sparkline);
    out
}

pub fn daily(rows: &[DailyRow], days: i64) -> String {
    let mut out = format!("Daily report, last {days} days\n");
    if rows.is_empty() {
        out.push_str("No samples recorded in this period.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<10}  {:>7}  {:>4}  {:>4}  {:>6}  {:>6}  {:>7}  {:>6}",
        "date", "samples", "min", "max", "mean", "temp", "health", "cycles"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<10}  {:>7}  {:>4.0}  {:>4.0}  {:>6.1}  {:>6.1}  {:>6.1}{}  {:>6.1}",
            row.date,
            row.samples,
            row.level.min,
            row.level.max,
            row.level.mean,
            row.mean_temperature,
            row.last_health,
            if row.last_health_estimated { "*" } else { " " },
            f64::from(row.half_cycles) / 2.0,
        );
    }
    if rows.iter().any(|r| r.last_health_estimated) {
        out.push_str("* estimated health\n");
    }
    out
}

pub fn age(r: &AgeReport) -> String {
    let Some(first) = r.first_sample else {
        return "No samples recorded yet.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tracking since {} ({} days, {} samples)",
        first.format("%Y-%m-%d"),
        r.days_tracked,
        r.samples
    );
    let _ = writeln!(out, "Lifetime cycles: {}", r.lifetime_cycles.cycles());
    match r.latest_measured_health {
        Some(h) => {
            let _ = writeln!(out, "Health:          {h:.1}%");
        }
        None => out.push_str("Health:          unknown (capacity never readable)\n"),
    }
    if let Some(wear) = r.wear_per_30_days {
        let _ = writeln!(out, "Wear:            {wear:.2} points per 30 days");
    }
    match r.days_to_end_of_life {
        Some(0) => out.push_str("Health is at or below 80%. Consider replacing the battery.\n"),
        Some(days) => {
            let _ = writeln!(out, "80% health in about {days} days at the current rate.");
        }
        None => {}
    }
    out
}

/// Guidance for `saver`. Nothing on the system is changed.
pub fn saver(latest: Option<&Sample>) -> String {
    let mut out = String::new();
    match latest {
        Some(s) => {
            let _ = writeln!(
                out,
                "Battery at {}% ({:.1}°C {}).",
                s.level,
                s.temperature,
                temp_indicator(s.temperature)
            );
            if s.level <= 20 {
                out.push_str("Low charge: lower screen brightness, close background apps, turn off location and Bluetooth.\n");
            } else if s.temperature > TEMP_HOT_C {
                out.push_str("Battery is hot: stop charging and close heavy apps until it cools down.\n");
            } else {
                out.push_str("No action needed.\n");
            }
        }
        None => out.push_str("No samples recorded yet. Run `battery-doctor monitor` first.\n"),
    }
    out
}
