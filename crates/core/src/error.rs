use crate::environment::SensorError;

/// Errors surfaced by the battery-doctor core.
///
/// Contract violations and unreadable persisted state are fatal: the command
/// that hit them should abort. Everything else is transient and, inside the
/// monitor loop, only abandons the current tick.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("invalid capacity reading: design {design} mAh, current {current} mAh")]
    InvalidCapacity { design: f64, current: f64 },
    #[error("battery status unavailable: {0}")]
    Sensor(#[from] SensorError),
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// True when retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidCapacity { .. } | Self::Migrate(_) | Self::CorruptRecord(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violations_are_fatal() {
        let err = AgentError::InvalidCapacity { design: 0.0, current: 10.0 };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("design 0 mAh"));
    }

    #[test]
    fn sensor_and_store_failures_are_transient() {
        let sensor: AgentError = SensorError::Malformed("eof".into()).into();
        assert!(!sensor.is_fatal());
        let store: AgentError = sqlx::Error::PoolTimedOut.into();
        assert!(!store.is_fatal());
    }
}
