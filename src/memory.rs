// src/memory.rs

use log::debug;
use sysinfo::System;

use crate::error::PlatformQueryError;

/// Installed physical memory at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub installed_kb: u64,
}

impl MemorySnapshot {
    pub fn from_kb(installed_kb: u64) -> Self {
        MemorySnapshot { installed_kb }
    }

    pub fn total_bytes(&self) -> u64 {
        self.installed_kb.saturating_mul(1024)
    }
}

/// Source of installed physical memory for the host.
pub trait MemoryProvider {
    fn query_installed_memory_kb(&self) -> Result<u64, PlatformQueryError>;

    fn snapshot(&self) -> Result<MemorySnapshot, PlatformQueryError> {
        self.query_installed_memory_kb().map(MemorySnapshot::from_kb)
    }
}

/// Memory provider backed by `sysinfo`.
///
/// `sysinfo` reports memory usable by the OS (`MemTotal` on Linux), which is
/// slightly below the physically installed amount since firmware and kernel
/// reservations are excluded.
#[derive(Debug, Clone, Default)]
pub struct HostMemory;

impl HostMemory {
    pub fn new() -> Self {
        HostMemory
    }
}

impl MemoryProvider for HostMemory {
    fn query_installed_memory_kb(&self) -> Result<u64, PlatformQueryError> {
        let mut sys = System::new();
        sys.refresh_memory();

        let total_bytes = sys.total_memory();
        if total_bytes == 0 {
            return Err(PlatformQueryError::Memory(
                "platform reported zero bytes of physical memory".to_string(),
            ));
        }

        let kb = total_bytes / 1024;
        debug!("host memory: {} KiB", kb);
        Ok(kb)
    }
}
