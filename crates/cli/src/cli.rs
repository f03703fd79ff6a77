use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use battery_doctor_core::config::MAX_DAYS;
use battery_doctor_core::report::ExportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "battery-doctor",
    version,
    about = "Battery health monitor: samples charge state and tracks capacity, cycles and calibration"
)]
pub struct Cli {
    /// SQLite database path. Defaults to $HOME/.local/share/battery-doctor/battery_data.db.
    #[arg(long, global = true, env = "BATTERY_DOCTOR_DB")]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sample the battery periodically until interrupted (default).
    Monitor(MonitorArgs),
    /// Check the calibration schedule, or confirm a finished calibration.
    Calibrate(CalibrateArgs),
    /// Summary over the last N days.
    Report(ReportArgs),
    /// Show power-saving guidance for the current charge level.
    Saver,
    /// Per-day breakdown over the last N days.
    #[command(name = "daily-report", alias = "daily_report")]
    DailyReport(DailyReportArgs),
    /// Dump every stored sample.
    Export(ExportArgs),
    /// Battery age, lifetime cycles and projected wear.
    Age,
    /// Inspect or change stored settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Default for Command {
    fn default() -> Self {
        Self::Monitor(MonitorArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct MonitorArgs {
    /// Print one line per tick instead of the full-screen dashboard.
    #[arg(long, default_value_t = false)]
    pub plain: bool,
    /// Log the charge alert instead of posting a notification.
    #[arg(long, default_value_t = false)]
    pub no_notify: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CalibrateArgs {
    /// Record a completed calibration cycle.
    #[arg(long, default_value_t = false)]
    pub confirm: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ReportArgs {
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
    pub days: i64,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DailyReportArgs {
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(1..=MAX_DAYS))]
    pub days: i64,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExportArgs {
    #[arg(long, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Effective value of every known setting.
    List,
    Get { key: String },
    Set { key: String, value: String },
}
