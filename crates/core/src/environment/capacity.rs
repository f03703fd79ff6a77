use std::path::{Path, PathBuf};

use crate::types::CapacityReading;

/// Source of design/current full-charge capacity. `None` means the data is
/// unavailable on this device, which callers treat as a normal condition.
#[async_trait::async_trait]
pub trait CapacityReader: Send + Sync {
    async fn read_capacity(&self) -> Option<CapacityReading>;
}

/// Reads `charge_full_design` and `charge_full` (µAh) from a Linux
/// power-supply directory and reports mAh.
#[derive(Debug, Clone)]
pub struct SysfsCapacityReader {
    dir: PathBuf,
}

impl SysfsCapacityReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_mah(path: &Path) -> Option<f64> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "capacity file unreadable");
                return None;
            }
        };
        match raw.trim().parse::<f64>() {
            Ok(micro_ah) => Some(micro_ah / 1000.0),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "capacity file not numeric");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl CapacityReader for SysfsCapacityReader {
    async fn read_capacity(&self) -> Option<CapacityReading> {
        let design_mah = Self::read_mah(&self.dir.join("charge_full_design")).await?;
        let current_mah = Self::read_mah(&self.dir.join("charge_full")).await?;
        Some(CapacityReading { design_mah, current_mah })
    }
}

/// Always returns the same reading. For tests and devices without sysfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCapacityReader(pub Option<CapacityReading>);

#[async_trait::async_trait]
impl CapacityReader for FixedCapacityReader {
    async fn read_capacity(&self) -> Option<CapacityReading> {
        self.0
    }
}
