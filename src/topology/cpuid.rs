// src/topology/cpuid.rs

use cache_size::{
    l1_cache_line_size, l1_cache_size, l2_cache_line_size, l2_cache_size, l3_cache_line_size,
    l3_cache_size,
};
use log::{debug, warn};

use crate::error::PlatformQueryError;
use crate::topology::{CacheDescriptor, CacheType, ProcessorTopologyRecord, TopologyProvider};

/// Portable topology provider built on the `cache-size` crate.
///
/// Only the L1 data, L2 and L3 caches visible to the calling processor are
/// reported. Each record covers every logical processor. A processor that
/// reports no caches yields an empty record set rather than an error.
#[derive(Debug, Clone, Default)]
pub struct CpuidTopology;

impl CpuidTopology {
    pub fn new() -> Self {
        CpuidTopology
    }
}

impl TopologyProvider for CpuidTopology {
    fn query_topology(&self) -> Result<Vec<ProcessorTopologyRecord>, PlatformQueryError> {
        let levels = [
            (1, CacheType::Data, l1_cache_size(), l1_cache_line_size()),
            (2, CacheType::Unified, l2_cache_size(), l2_cache_line_size()),
            (3, CacheType::Unified, l3_cache_size(), l3_cache_line_size()),
        ];
        let records = cache_records(all_processors_mask(num_cpus::get()), &levels);

        if records.is_empty() {
            warn!("cpuid topology: processor reports no cache levels");
        }
        debug!("cpuid topology: {} cache records", records.len());
        Ok(records)
    }
}

fn cache_records(
    mask: u64,
    levels: &[(u8, CacheType, Option<usize>, Option<usize>)],
) -> Vec<ProcessorTopologyRecord> {
    levels
        .iter()
        .filter_map(|&(level, cache_type, size, line_size)| {
            let size = u32::try_from(size?).ok()?;
            Some(ProcessorTopologyRecord::cache(
                mask,
                CacheDescriptor {
                    level,
                    associativity: 0,
                    line_size: line_size.and_then(|l| u16::try_from(l).ok()).unwrap_or(0),
                    size,
                    cache_type,
                },
            ))
        })
        .collect()
}

fn all_processors_mask(count: usize) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1u64 << count) - 1
    }
}
