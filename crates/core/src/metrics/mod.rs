//! Pure derivations over the sample series: capacity health, charge-cycle
//! estimate and sparkline quantization. Nothing here touches the store.

pub mod cycles;
pub mod health;
pub mod sparkline;

pub use cycles::{CycleEstimate, estimate_cycles};
pub use health::health;
pub use sparkline::{Glyph, sparkline};
