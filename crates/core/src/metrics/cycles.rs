//! Charge-cycle estimation from the level series.
//!
//! This is a heuristic, not a hardware cycle counter. The series is split
//! into monotonic runs (flat steps neither break nor extend a run); every run
//! that spans at least [`RUN_THRESHOLD`] points counts as half a cycle. The
//! half-cycle total is truncated to whole cycles, so an odd count drops its
//! last half. Small reversals split a long run, which makes the estimate
//! conservative on noisy series.

use std::cmp::Ordering;

/// Minimum level swing, in percentage points, for a run to count. Inclusive.
pub const RUN_THRESHOLD: u8 = 80;

/// The run currently being tracked. `start` is the index where it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Idle,
    Rising(usize),
    Falling(usize),
}

/// Result of scanning a level series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleEstimate {
    pub half_cycles: u32,
}

impl CycleEstimate {
    /// Whole cycles; an unpaired half-cycle is dropped.
    pub fn cycles(self) -> u32 {
        self.half_cycles / 2
    }

    /// True when truncation discarded half a cycle.
    pub fn has_unpaired_half(self) -> bool {
        self.half_cycles % 2 == 1
    }
}

/// Estimate whole charge cycles from levels ordered earliest-first.
pub fn estimate_cycles(levels: &[u8]) -> u32 {
    estimate(levels, RUN_THRESHOLD).cycles()
}

/// Scan `levels` (earliest-first) and count qualifying half-cycles.
pub fn estimate(levels: &[u8], threshold: u8) -> CycleEstimate {
    let qualifies = |start: usize, end: usize| levels[start].abs_diff(levels[end]) >= threshold;
    let mut half_cycles = 0u32;
    let mut run = Run::Idle;

    for i in 1..levels.len() {
        let last = i - 1;
        run = match (run, levels[i].cmp(&levels[last])) {
            (run, Ordering::Equal) => run,
            (Run::Rising(start), Ordering::Greater) => Run::Rising(start),
            (Run::Falling(start), Ordering::Less) => Run::Falling(start),
            (Run::Idle, Ordering::Greater) => Run::Rising(last),
            (Run::Idle, Ordering::Less) => Run::Falling(last),
            (Run::Falling(start), Ordering::Greater) => {
                if qualifies(start, last) {
                    half_cycles += 1;
                }
                Run::Rising(last)
            }
            (Run::Rising(start), Ordering::Less) => {
                if qualifies(start, last) {
                    half_cycles += 1;
                }
                Run::Falling(last)
            }
        };
    }

    // End of input closes the open run.
    if let Run::Rising(start) | Run::Falling(start) = run
        && qualifies(start, levels.len() - 1)
    {
        half_cycles += 1;
    }

    CycleEstimate { half_cycles }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_have_no_cycles() {
        assert_eq!(estimate_cycles(&[]), 0);
        assert_eq!(estimate_cycles(&[50]), 0);
        assert_eq!(estimate_cycles(&[50, 50, 50]), 0);
    }

    #[test]
    fn full_rise_then_full_fall_is_one_cycle() {
        assert_eq!(estimate_cycles(&[10, 90, 10]), 1);
        assert_eq!(estimate(&[10, 90, 10], RUN_THRESHOLD).half_cycles, 2);
    }

    #[test]
    fn shallow_runs_do_not_count() {
        assert_eq!(estimate_cycles(&[10, 50, 10]), 0);
        assert_eq!(estimate_cycles(&[10, 89, 10]), 0);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(estimate_cycles(&[0, 80, 0]), 1);
        assert_eq!(estimate_cycles(&[20, 100, 20]), 1);
    }

    #[test]
    fn multi_step_runs_and_plateaus() {
        assert_eq!(estimate_cycles(&[10, 30, 60, 95, 40, 5]), 1);
        assert_eq!(estimate_cycles(&[10, 10, 50, 50, 90, 90, 50, 10]), 1);
    }

    #[test]
    fn odd_half_cycle_is_truncated() {
        let single = estimate(&[10, 90], RUN_THRESHOLD);
        assert_eq!(single.half_cycles, 1);
        assert_eq!(single.cycles(), 0);
        assert!(single.has_unpaired_half());

        let three = estimate(&[10, 90, 10, 90], RUN_THRESHOLD);
        assert_eq!(three.half_cycles, 3);
        assert_eq!(three.cycles(), 1);
    }

    #[test]
    fn repeated_full_cycles_accumulate() {
        assert_eq!(estimate_cycles(&[0, 100, 0, 100, 0]), 2);
    }

    #[test]
    fn small_reversal_splits_a_run() {
        // 100 → 90 → 95 → 20: no single monotonic run reaches 80 points.
        assert_eq!(estimate(&[100, 90, 95, 20], RUN_THRESHOLD).half_cycles, 0);
    }

    #[test]
    fn custom_threshold() {
        assert_eq!(estimate(&[10, 50, 10], 40).cycles(), 1);
        assert_eq!(estimate(&[10, 50, 10], 41).cycles(), 0);
    }
}
