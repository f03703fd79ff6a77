mod cli;
mod commands;
mod event;
mod render;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use battery_doctor_core::config::AgentCfg;
use battery_doctor_core::store::Store;

use cli::{Cli, Command};

const DB_FILE: &str = "battery_data.db";
const LOG_FILE: &str = "battery-doctor.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    let dashboard = matches!(&command, Command::Monitor(args) if commands::wants_dashboard(args));
    init_tracing(dashboard, &db_path)?;

    if dashboard {
        // Restore the terminal even when a panic unwinds out of raw mode.
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen);
            default_hook(info);
        }));
    }

    let store = Store::open(&db_path)
        .await
        .with_context(|| format!("cannot open database {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "database ready");

    let result = run(command, &store, &db_path).await;
    store.close().await;
    result
}

async fn run(command: Command, store: &Store, db_path: &Path) -> anyhow::Result<()> {
    let cfg = Arc::new(AgentCfg::load(store.pool()).await?);
    match command {
        Command::Monitor(args) => commands::monitor(store, cfg, &args, db_path).await,
        Command::Calibrate(args) => commands::calibrate(store, &cfg, &args).await,
        Command::Report(args) => commands::report(store, &cfg, args.days).await,
        Command::Saver => commands::saver(store).await,
        Command::DailyReport(args) => commands::daily_report(store, &cfg, args.days).await,
        Command::Export(args) => commands::export(store, args.format, args.output.as_deref()).await,
        Command::Age => commands::age(store, &cfg).await,
        Command::Config(cmd) => commands::config(store, &cmd).await,
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME").context("HOME is not set; pass --db")?;
    Ok(PathBuf::from(home)
        .join(".local/share/battery-doctor")
        .join(DB_FILE))
}

/// Logs go to stderr. While the dashboard owns the terminal they go to a
/// file next to the database, and only when RUST_LOG is set.
fn init_tracing(dashboard: bool, db_path: &Path) -> anyhow::Result<()> {
    if dashboard {
        if std::env::var("RUST_LOG").is_ok() {
            let path = db_path.with_file_name(LOG_FILE);
            let file = std::fs::File::create(&path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env())
                .with(fmt::layer().json().with_target(true).with_writer(file))
                .init();
        }
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if std::env::var_os("BATTERY_DOCTOR_LOG_JSON").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
