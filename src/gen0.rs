// src/gen0.rs
//
// Generation-0 minimum size heuristic.

use log::{debug, warn};

use crate::error::InvariantViolation;

/// Smallest gen0 size ever produced (256 KiB).
pub const GEN0_FLOOR: u64 = 256 * 1024;

/// Aggregate gen0 across all processors may not exceed 1/6 of physical memory.
pub const SCALE_BUDGET_DIVISOR: u64 = 6;

/// Whether internal preconditions fail the computation or are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantChecks {
    Enforce,
    Ignore,
}

impl Default for InvariantChecks {
    /// Enforced in debug builds, ignored in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            InvariantChecks::Enforce
        } else {
            InvariantChecks::Ignore
        }
    }
}

impl InvariantChecks {
    pub fn from_flag(enforce: bool) -> Self {
        if enforce {
            InvariantChecks::Enforce
        } else {
            InvariantChecks::Ignore
        }
    }

    fn check(self, holds: bool, violation: impl FnOnce() -> InvariantViolation) -> Result<(), InvariantViolation> {
        if holds {
            return Ok(());
        }
        let violation = violation();
        match self {
            InvariantChecks::Enforce => Err(violation),
            InvariantChecks::Ignore => {
                warn!("ignoring invariant violation: {}", violation);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingInputs {
    /// Largest cache size, scaled by the extractor.
    pub scaled_cache_size: u64,
    /// Largest cache size as reported.
    pub true_cache_size: u64,
    pub logical_processors: u64,
    pub total_memory_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gen0Size {
    pub bytes: u64,
    /// Set when the per-processor total exceeded the memory budget and the size was halved.
    pub budget_exceeded: bool,
}

pub fn compute_gen0_min_size(
    inputs: &SizingInputs,
    checks: InvariantChecks,
) -> Result<Gen0Size, InvariantViolation> {
    let mut gen0_size = inputs.scaled_cache_size.max(GEN0_FLOOR);
    let true_floor = inputs.true_cache_size.max(GEN0_FLOOR);

    checks.check(inputs.scaled_cache_size > 0, || {
        InvariantViolation::NonPositiveCacheSize {
            scaled_cache_size: inputs.scaled_cache_size,
        }
    })?;

    let aggregate = gen0_size.saturating_mul(inputs.logical_processors);
    let budget = inputs.total_memory_bytes / SCALE_BUDGET_DIVISOR;
    let budget_exceeded = aggregate > budget;

    if budget_exceeded {
        gen0_size /= 2;
        if gen0_size <= true_floor {
            gen0_size = true_floor;
        }
    }

    debug!(
        "gen0: {} bytes x {} processors = {} vs budget {} (exceeded: {}) -> {}",
        inputs.scaled_cache_size.max(GEN0_FLOOR),
        inputs.logical_processors,
        aggregate,
        budget,
        budget_exceeded,
        gen0_size
    );

    Ok(Gen0Size {
        bytes: gen0_size,
        budget_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * MIB;

    fn inputs(scaled: u64, true_size: u64, processors: u64, memory: u64) -> SizingInputs {
        SizingInputs {
            scaled_cache_size: scaled,
            true_cache_size: true_size,
            logical_processors: processors,
            total_memory_bytes: memory,
        }
    }

    #[test]
    fn test_many_cores_modest_memory_halves() {
        let result = compute_gen0_min_size(&inputs(32 * MIB, 8 * MIB, 64, 8 * GIB), InvariantChecks::Enforce).unwrap();
        assert_eq!(result.bytes, 16777216);
        assert!(result.budget_exceeded);
    }

    #[test]
    fn test_few_cores_ample_memory_unchanged() {
        let result = compute_gen0_min_size(&inputs(32 * MIB, 8 * MIB, 4, 64 * GIB), InvariantChecks::Enforce).unwrap();
        assert_eq!(result.bytes, 33554432);
        assert!(!result.budget_exceeded);
    }

    #[test]
    fn test_no_cache_information_uses_floor() {
        let result = compute_gen0_min_size(&inputs(0, 0, 8, 16 * GIB), InvariantChecks::Ignore).unwrap();
        assert_eq!(result.bytes, GEN0_FLOOR);
    }

    #[test]
    fn test_no_cache_information_fails_when_enforced() {
        let result = compute_gen0_min_size(&inputs(0, 0, 8, 16 * GIB), InvariantChecks::Enforce);
        assert_eq!(
            result,
            Err(InvariantViolation::NonPositiveCacheSize { scaled_cache_size: 0 })
        );
    }

    #[test]
    fn test_halving_clamps_to_true_size() {
        // 4 MiB halves to 2 MiB, below the 3 MiB true cache size.
        let result = compute_gen0_min_size(&inputs(4 * MIB, 3 * MIB, 64, GIB), InvariantChecks::Enforce).unwrap();
        assert!(result.budget_exceeded);
        assert_eq!(result.bytes, 3 * MIB);
    }

    #[test]
    fn test_halving_clamps_to_floor() {
        // 300 KiB halves below the floor; the true size is smaller still.
        let result = compute_gen0_min_size(&inputs(300 * 1024, 75 * 1024, 1024, 64 * MIB), InvariantChecks::Enforce).unwrap();
        assert!(result.budget_exceeded);
        assert_eq!(result.bytes, GEN0_FLOOR);
    }

    #[test]
    fn test_halving_equal_to_true_floor() {
        let result = compute_gen0_min_size(&inputs(8 * MIB, 4 * MIB, 64, GIB), InvariantChecks::Enforce).unwrap();
        assert_eq!(result.bytes, 4 * MIB);
    }

    #[test]
    fn test_budget_boundary_is_not_exceeded() {
        // Exactly at budget: 1 MiB x 6 processors == 36 MiB / 6.
        let result = compute_gen0_min_size(&inputs(MIB, MIB / 4, 6, 36 * MIB), InvariantChecks::Enforce).unwrap();
        assert!(!result.budget_exceeded);
        assert_eq!(result.bytes, MIB);
    }

    #[test]
    fn test_aggregate_overflow_counts_as_exceeded() {
        let result = compute_gen0_min_size(&inputs(u64::MAX / 2, MIB, u64::MAX, u64::MAX), InvariantChecks::Enforce).unwrap();
        assert!(result.budget_exceeded);
        assert_eq!(result.bytes, u64::MAX / 4);
    }

    #[test]
    fn test_properties_over_input_grid() {
        let caches = [0, 1, 64 * 1024, 200 * 1024, MIB, 8 * MIB, 32 * MIB, 512 * MIB];
        let processors = [1, 2, 8, 64, 256];
        let memories = [0, 256 * MIB, 4 * GIB, 64 * GIB, 2048 * GIB];

        for &true_size in &caches {
            let scaled = true_size * 4;
            for &n in &processors {
                for &memory in &memories {
                    let input = inputs(scaled, true_size, n, memory);
                    let result = compute_gen0_min_size(&input, InvariantChecks::Ignore).unwrap();
                    let gen0 = scaled.max(GEN0_FLOOR);
                    let true_floor = true_size.max(GEN0_FLOOR);

                    assert!(result.bytes >= GEN0_FLOOR);
                    if gen0 * n <= memory / SCALE_BUDGET_DIVISOR {
                        assert_eq!(result.bytes, gen0, "{:?}", input);
                    } else {
                        assert_eq!(result.bytes, (gen0 / 2).max(true_floor), "{:?}", input);
                    }
                }
            }
        }
    }

    #[test]
    fn test_default_checks_follow_build_profile() {
        let expected = if cfg!(debug_assertions) {
            InvariantChecks::Enforce
        } else {
            InvariantChecks::Ignore
        };
        assert_eq!(InvariantChecks::default(), expected);
        assert_eq!(InvariantChecks::from_flag(true), InvariantChecks::Enforce);
        assert_eq!(InvariantChecks::from_flag(false), InvariantChecks::Ignore);
    }
}
