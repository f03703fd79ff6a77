use std::io::Stdout;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use battery_doctor_core::config::AgentCfg;
use battery_doctor_core::types::MonitorStatus;

use crate::event::Input;
use crate::widgets;

/// State drawn by the dashboard.
pub struct Dashboard {
    pub status: MonitorStatus,
    pub tick_secs: u64,
    pub alert_level_pct: u8,
    pub db_label: String,
}

impl Dashboard {
    pub fn new(cfg: &AgentCfg, db_label: String) -> Self {
        Self {
            status: MonitorStatus::default(),
            tick_secs: cfg.tick_secs,
            alert_level_pct: cfg.alert_level_pct,
            db_label,
        }
    }
}

/// Raw mode and the alternate screen, restored on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Tells the input thread to exit when dropped, on every return path.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Draw the dashboard until the user quits or `token` is cancelled.
/// Quitting cancels `token`, which stops the monitor.
pub async fn run_dashboard(
    mut dashboard: Dashboard,
    mut status_rx: watch::Receiver<MonitorStatus>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let stop = Arc::new(AtomicBool::new(false));
    let _stop_input = StopOnDrop(stop.clone());
    let mut input_rx = crate::event::spawn(stop);

    dashboard.status = status_rx.borrow().clone();
    guard.terminal.draw(|f| widgets::draw(f, &dashboard))?;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            input = input_rx.recv() => match input {
                Some(Input::Quit) | None => {
                    token.cancel();
                    break;
                }
                Some(Input::Redraw) => {}
            },
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                dashboard.status = status_rx.borrow_and_update().clone();
            }
        }
        guard.terminal.draw(|f| widgets::draw(f, &dashboard))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_thread_is_stopped_on_early_return() {
        let stop = Arc::new(AtomicBool::new(false));
        let failing = || -> anyhow::Result<()> {
            let _guard = StopOnDrop(stop.clone());
            anyhow::bail!("draw failed")
        };
        assert!(failing().is_err());
        assert!(stop.load(Ordering::Relaxed));
    }
}
