use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::alert::{ALERT_TITLE, ChargeAlert};
use crate::config::AgentCfg;
use crate::environment::{CapacityReader, Notifier, StatusReader};
use crate::error::AgentError;
use crate::metrics::sparkline::{self, WINDOW};
use crate::metrics::{CycleEstimate, cycles, health};
use crate::store::{Store, samples};
use crate::types::{BatteryStatus, MonitorStatus, PlugState, Sample, days_before};

/// Source of sample timestamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// External collaborators the monitor reads from and notifies through.
#[derive(Clone)]
pub struct Sensors {
    pub status: Arc<dyn StatusReader>,
    pub capacity: Arc<dyn CapacityReader>,
    pub notifier: Arc<dyn Notifier>,
}

/// Series-level values recomputed after each persisted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub cycles: CycleEstimate,
    pub sparkline: String,
}

/// What one successful tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub sample: Sample,
    pub plugged: PlugState,
    /// None when the derivation queries failed; the sample is still stored.
    pub derived: Option<Derived>,
    pub notified: bool,
    pub pruned: u64,
}

/// Periodic battery sampler. Runs until its token is cancelled or a fatal
/// error occurs; transient failures only abandon the current tick.
pub struct Monitor<'a> {
    cfg: Arc<AgentCfg>,
    store: &'a Store,
    sensors: Sensors,
    alert: ChargeAlert,
    clock: Clock,
    token: CancellationToken,
    tick_count: u64,
    consecutive_failures: u32,
    /// Status watch channel, refreshed after every tick.
    status_tx: watch::Sender<MonitorStatus>,
}

impl<'a> Monitor<'a> {
    /// Create a monitor. Returns (Monitor, status_receiver).
    pub fn new(
        cfg: Arc<AgentCfg>,
        store: &'a Store,
        sensors: Sensors,
        token: CancellationToken,
    ) -> (Self, watch::Receiver<MonitorStatus>) {
        let (status_tx, status_rx) = watch::channel(MonitorStatus::default());
        let alert = ChargeAlert::new(cfg.alert_level_pct, cfg.alert_repeat);
        let monitor = Self {
            cfg,
            store,
            sensors,
            alert,
            clock: Box::new(Utc::now),
            token,
            tick_count: 0,
            consecutive_failures: 0,
            status_tx,
        };
        (monitor, status_rx)
    }

    /// Replace the wall clock used to timestamp samples.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Tick immediately, then once per interval until cancelled.
    /// Returns `Err` only for fatal errors.
    pub async fn run(&mut self) -> Result<(), AgentError> {
        let interval = self.cfg.tick_interval();
        let token = self.token.clone();

        tracing::info!(
            interval_secs = interval.as_secs(),
            source = self.sensors.status.name(),
            "battery monitor started"
        );

        while !token.is_cancelled() {
            if let Err(e) = self.tick().await
                && e.is_fatal()
            {
                tracing::error!(error = %e, "fatal error, stopping monitor");
                return Err(e);
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {},
            }
        }

        tracing::info!(tick_count = self.tick_count, "battery monitor stopped");
        Ok(())
    }

    /// Single tick: read, compute health, persist, derive, maybe notify.
    pub async fn tick(&mut self) -> Result<TickOutcome, AgentError> {
        self.tick_count += 1;
        let span = tracing::info_span!("tick", n = self.tick_count);
        let result = self.sample_once().instrument(span).await;

        match &result {
            Ok(outcome) => {
                self.consecutive_failures = 0;
                self.status_tx.send_replace(MonitorStatus {
                    tick_count: self.tick_count,
                    last_sample: Some(outcome.sample.clone()),
                    plugged: Some(outcome.plugged),
                    cycles: outcome.derived.as_ref().map(|d| d.cycles.cycles()),
                    sparkline: outcome
                        .derived
                        .as_ref()
                        .map(|d| d.sparkline.clone())
                        .unwrap_or_default(),
                    consecutive_failures: 0,
                    last_error: None,
                    notified: outcome.notified,
                });
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    tick = self.tick_count,
                    failures = self.consecutive_failures,
                    error = %e,
                    "tick abandoned"
                );
                let (tick_count, failures) = (self.tick_count, self.consecutive_failures);
                self.status_tx.send_modify(|s| {
                    s.tick_count = tick_count;
                    s.consecutive_failures = failures;
                    s.last_error = Some(e.to_string());
                    s.notified = false;
                });
            }
        }
        result
    }

    async fn sample_once(&mut self) -> Result<TickOutcome, AgentError> {
        // Nothing is written until the status read and health check pass.
        let status = self.sensors.status.read_status().await?;
        let reading = self.sensors.capacity.read_capacity().await;
        let health = health::assess(reading)?;
        if health.is_estimated() {
            tracing::debug!("capacity unavailable, health estimated");
        }

        let sample = Sample::new((self.clock)(), &status, health);
        samples::insert(self.store.pool(), &sample).await?;
        tracing::debug!(
            level = sample.level,
            health = sample.capacity_health,
            estimated = sample.health_estimated,
            "sample recorded"
        );

        let pruned = self.prune(sample.timestamp).await;
        let derived = match self.derive().await {
            Ok(derived) => Some(derived),
            Err(e) => {
                tracing::warn!(error = %e, "derivation failed, sample kept");
                None
            }
        };
        let notified = self.maybe_notify(&status).await;

        Ok(TickOutcome {
            sample,
            plugged: status.plugged,
            derived,
            notified,
            pruned,
        })
    }

    async fn derive(&self) -> Result<Derived, sqlx::Error> {
        let pool = self.store.pool();
        let levels = samples::fetch_levels(pool).await?;
        let recent = samples::recent_health(pool, WINDOW as i64).await?;
        Ok(Derived {
            cycles: cycles::estimate(&levels, self.cfg.cycle_run_threshold),
            sparkline: sparkline::render(&sparkline::sparkline(&recent)),
        })
    }

    async fn prune(&self, now: DateTime<Utc>) -> u64 {
        if self.cfg.retention_days <= 0 {
            return 0;
        }
        let cutoff = days_before(now, self.cfg.retention_days);
        match samples::prune_before(self.store.pool(), cutoff).await {
            Ok(0) => 0,
            Ok(n) => {
                tracing::info!(removed = n, retention_days = self.cfg.retention_days, "pruned old samples");
                n
            }
            Err(e) => {
                tracing::warn!(error = %e, "retention prune failed");
                0
            }
        }
    }

    async fn maybe_notify(&mut self, status: &BatteryStatus) -> bool {
        if !self.alert.update(status) {
            return false;
        }
        let message = self.alert.message();
        match self.sensors.notifier.notify(ALERT_TITLE, &message).await {
            Ok(()) => {
                tracing::info!(level = status.percentage, "charge alert sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "charge alert not delivered");
                false
            }
        }
    }
}
