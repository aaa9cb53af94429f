// src/extractor.rs

use log::trace;

use crate::topology::ProcessorTopologyRecord;

/// Scale-up applied to the largest cache when the true size is not requested.
pub const CACHE_SCALE_FACTOR: u64 = 4;

/// Reduces topology records to the largest cache size found on the host.
///
/// Every cache record competes regardless of level or processor group, so in
/// practice this picks the largest last-level cache. Unless `true_size` is
/// set, the result is multiplied by [`CACHE_SCALE_FACTOR`]. Returns 0 when no
/// cache records are present.
pub fn extract_max_cache_size(records: &[ProcessorTopologyRecord], true_size: bool) -> u64 {
    let largest = records
        .iter()
        .filter_map(|record| record.cache_descriptor())
        .map(|cache| u64::from(cache.size))
        .max()
        .unwrap_or(0);

    if true_size {
        largest
    } else {
        largest * CACHE_SCALE_FACTOR
    }
}

/// Both cache size variants extracted from one topology snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizes {
    pub scaled: u64,
    pub true_size: u64,
}

impl CacheSizes {
    pub fn from_records(records: &[ProcessorTopologyRecord]) -> Self {
        let sizes = CacheSizes {
            scaled: extract_max_cache_size(records, false),
            true_size: extract_max_cache_size(records, true),
        };
        trace!("cache sizes from {} records: {:?}", records.len(), sizes);
        sizes
    }
}
