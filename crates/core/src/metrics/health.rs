use crate::error::AgentError;
use crate::types::{CapacityReading, HealthReading};

/// Health reported when capacity cannot be read (no root, unsupported device).
pub const FALLBACK_HEALTH_PCT: f64 = 100.0;

/// Current full-charge capacity as a percentage of design capacity.
///
/// Not clamped: a battery reporting more than its design capacity yields
/// more than 100. A non-positive design capacity or a negative current
/// capacity is a caller bug and returns `InvalidCapacity`.
pub fn health(design_mah: f64, current_mah: f64) -> Result<f64, AgentError> {
    let design_ok = design_mah.is_finite() && design_mah > 0.0;
    let current_ok = current_mah.is_finite() && current_mah >= 0.0;
    if !design_ok || !current_ok {
        return Err(AgentError::InvalidCapacity {
            design: design_mah,
            current: current_mah,
        });
    }
    Ok(100.0 * current_mah / design_mah)
}

/// Resolve an optional capacity reading into a tagged health value.
/// A missing reading is not an error: it yields the flagged fallback.
pub fn assess(reading: Option<CapacityReading>) -> Result<HealthReading, AgentError> {
    match reading {
        Some(r) => health(r.design_mah, r.current_mah).map(HealthReading::Measured),
        None => Ok(HealthReading::Estimated(FALLBACK_HEALTH_PCT)),
    }
}
