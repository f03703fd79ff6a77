use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use battery_doctor_core::calibration::CalibrationScheduler;
use battery_doctor_core::config::AgentCfg;
use battery_doctor_core::environment::{
    LogNotifier, Notifier, SysfsCapacityReader, TermuxNotifier, TermuxStatusReader,
};
use battery_doctor_core::report::{self, ExportFormat};
use battery_doctor_core::runtime::{Monitor, Sensors, ShutdownGuard};
use battery_doctor_core::store::{Store, samples, settings};

use crate::cli::{CalibrateArgs, ConfigCommand, MonitorArgs};
use crate::{render, tui};

/// True when `monitor` should draw the full-screen dashboard.
pub fn wants_dashboard(args: &MonitorArgs) -> bool {
    !args.plain && io::stdout().is_terminal()
}

pub async fn monitor(
    store: &Store,
    cfg: Arc<AgentCfg>,
    args: &MonitorArgs,
    db_path: &Path,
) -> anyhow::Result<()> {
    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();
    let token = shutdown.token();

    let notifier: Arc<dyn Notifier> = if args.no_notify {
        Arc::new(LogNotifier)
    } else {
        Arc::new(TermuxNotifier::new(cfg.status_timeout()))
    };
    let sensors = Sensors {
        status: Arc::new(TermuxStatusReader::new(cfg.status_timeout())),
        capacity: Arc::new(SysfsCapacityReader::new(cfg.power_supply_dir.clone())),
        notifier,
    };
    let (mut monitor, mut status_rx) = Monitor::new(cfg.clone(), store, sensors, token.clone());

    let monitor_fut = async {
        let result = monitor.run().await;
        // Stop the view once the loop is done, whatever the reason.
        token.cancel();
        result
    };

    let (monitor_result, view_result) = if wants_dashboard(args) {
        let dashboard = tui::Dashboard::new(&cfg, db_path.display().to_string());
        tokio::join!(monitor_fut, tui::run_dashboard(dashboard, status_rx, token.clone()))
    } else {
        let view = async {
            while let Ok(()) = tokio::select! {
                _ = token.cancelled() => Err(()),
                changed = status_rx.changed() => changed.map_err(|_| ()),
            } {
                let line = render::status_line(&status_rx.borrow_and_update());
                println!("{line}");
            }
            anyhow::Ok(())
        };
        tokio::join!(monitor_fut, view)
    };

    monitor_result.context("monitor stopped")?;
    view_result
}

pub async fn calibrate(store: &Store, cfg: &AgentCfg, args: &CalibrateArgs) -> anyhow::Result<()> {
    let scheduler = CalibrationScheduler::new(store, cfg.calibration_interval_days);
    let now = Utc::now();
    let outcome = if args.confirm {
        scheduler.confirm(now).await?
    } else {
        scheduler.calibrate(now).await?
    };
    println!("{}", render::calibration(&outcome));
    Ok(())
}

pub async fn report(store: &Store, cfg: &AgentCfg, days: i64) -> anyhow::Result<()> {
    let r = report::summary::build(store, days, Utc::now(), cfg.cycle_run_threshold).await?;
    print!("{}", render::report(&r));
    Ok(())
}

pub async fn daily_report(store: &Store, cfg: &AgentCfg, days: i64) -> anyhow::Result<()> {
    let rows = report::daily::build(store, days, Utc::now(), cfg.cycle_run_threshold).await?;
    print!("{}", render::daily(&rows, days));
    Ok(())
}

pub async fn age(store: &Store, cfg: &AgentCfg) -> anyhow::Result<()> {
    let r = report::age::build(store, Utc::now(), cfg.cycle_run_threshold).await?;
    print!("{}", render::age(&r));
    Ok(())
}

pub async fn saver(store: &Store) -> anyhow::Result<()> {
    let latest = samples::latest(store.pool()).await?;
    print!("{}", render::saver(latest.as_ref()));
    Ok(())
}

pub async fn export(store: &Store, format: ExportFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let written = match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let n = report::export::export(store, format, io::BufWriter::new(file)).await?;
            eprintln!("Exported {n} samples to {}", path.display());
            n
        }
        None => {
            let stdout = io::stdout();
            let n = report::export::export(store, format, stdout.lock()).await?;
            io::stdout().flush()?;
            n
        }
    };
    tracing::debug!(written, "export finished");
    Ok(())
}

pub async fn config(store: &Store, cmd: &ConfigCommand) -> anyhow::Result<()> {
    let pool = store.pool();
    match cmd {
        ConfigCommand::List => {
            let cfg = AgentCfg::load(pool).await?;
            for (key, value, desc) in cfg.entries() {
                println!("{key:<26} {value:<34} {desc}");
            }
        }
        ConfigCommand::Get { key } => match settings::get(pool, key).await? {
            Some(value) => println!("{value}"),
            None => {
                let cfg = AgentCfg::default();
                let default = cfg
                    .entries()
                    .into_iter()
                    .find(|(k, _, _)| *k == key.as_str())
                    .map(|(_, v, _)| v);
                match default {
                    Some(v) => println!("{v} (default)"),
                    None => anyhow::bail!("unknown config key: {key}"),
                }
            }
        },
        ConfigCommand::Set { key, value } => {
            AgentCfg::validate(key, value).map_err(anyhow::Error::msg)?;
            if !AgentCfg::is_known_key(key) {
                tracing::warn!(key = key.as_str(), "storing unknown config key");
            }
            settings::set(pool, key, value).await?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
