//! Battery telemetry core: sampling loop, sample store and the metrics and
//! reports derived from the stored series.

pub mod calibration;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runtime;
pub mod store;
pub mod types;
