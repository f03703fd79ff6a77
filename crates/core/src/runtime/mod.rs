mod alert;
mod monitor;
mod shutdown;

pub use alert::{ALERT_TITLE, ChargeAlert};
pub use monitor::{Clock, Derived, Monitor, Sensors, TickOutcome};
pub use shutdown::ShutdownGuard;
pub use crate::types::MonitorStatus;
