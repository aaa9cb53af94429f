// src/pipeline.rs

use std::fmt;

use log::{debug, info};

use crate::error::SizingError;
use crate::extractor::CacheSizes;
use crate::gen0::{compute_gen0_min_size, InvariantChecks, SizingInputs};
use crate::memory::{HostMemory, MemoryProvider};
use crate::topology::{HostTopology, TopologyProvider};

/// Outcome of one sizing run, with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gen0SizeResult {
    pub gen0_size: u64,
    pub scaled_cache_size: u64,
    pub true_cache_size: u64,
    pub logical_processors: u64,
    pub total_memory_bytes: u64,
    pub budget_exceeded: bool,
}

impl fmt::Display for Gen0SizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gen0 min size {} bytes (cache {} scaled / {} true, {} processors, {} MB memory{})",
            self.gen0_size,
            self.scaled_cache_size,
            self.true_cache_size,
            self.logical_processors,
            self.total_memory_bytes / 1024 / 1024,
            if self.budget_exceeded { ", halved for memory budget" } else { "" },
        )
    }
}

/// Queries the providers once and runs the sizing heuristic over the snapshots.
pub struct Gen0Pipeline<T, M> {
    topology: T,
    memory: M,
    logical_processors: usize,
    checks: InvariantChecks,
}

impl Gen0Pipeline<HostTopology, HostMemory> {
    pub fn host() -> Self {
        Gen0Pipeline::new(HostTopology::new(), HostMemory::new())
    }
}

impl<T: TopologyProvider, M: MemoryProvider> Gen0Pipeline<T, M> {
    pub fn new(topology: T, memory: M) -> Self {
        Gen0Pipeline {
            topology,
            memory,
            logical_processors: num_cpus::get(),
            checks: InvariantChecks::default(),
        }
    }

    pub fn with_processor_count(mut self, logical_processors: usize) -> Self {
        self.logical_processors = logical_processors;
        self
    }

    pub fn with_invariant_checks(mut self, checks: InvariantChecks) -> Self {
        self.checks = checks;
        self
    }

    pub fn run(&self) -> Result<Gen0SizeResult, SizingError> {
        let records = self.topology.query_topology()?;
        let caches = CacheSizes::from_records(&records);
        debug!(
            "{} topology records, largest cache {} bytes",
            records.len(),
            caches.true_size
        );

        let memory = self.memory.snapshot()?;

        let inputs = SizingInputs {
            scaled_cache_size: caches.scaled,
            true_cache_size: caches.true_size,
            logical_processors: self.logical_processors as u64,
            total_memory_bytes: memory.total_bytes(),
        };
        let gen0 = compute_gen0_min_size(&inputs, self.checks)?;

        let result = Gen0SizeResult {
            gen0_size: gen0.bytes,
            scaled_cache_size: inputs.scaled_cache_size,
            true_cache_size: inputs.true_cache_size,
            logical_processors: inputs.logical_processors,
            total_memory_bytes: inputs.total_memory_bytes,
            budget_exceeded: gen0.budget_exceeded,
        };
        info!("{}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_budget() {
        let result = Gen0SizeResult {
            gen0_size: 16777216,
            scaled_cache_size: 33554432,
            true_cache_size: 8388608,
            logical_processors: 64,
            total_memory_bytes: 8589934592,
            budget_exceeded: true,
        };
        assert_eq!(
            result.to_string(),
            "gen0 min size 16777216 bytes (cache 33554432 scaled / 8388608 true, 64 processors, 8192 MB memory, halved for memory budget)"
        );

        let unchanged = Gen0SizeResult { budget_exceeded: false, ..result };
        assert!(unchanged.to_string().ends_with("8192 MB memory)"));
    }
}
