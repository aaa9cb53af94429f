// src/topology/mod.rs

pub mod cpuid;
pub mod sysfs;

pub use cpuid::CpuidTopology;
pub use sysfs::SysfsTopology;

use crate::error::PlatformQueryError;

/// Kind of relationship a topology record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    ProcessorCore,
    NumaNode,
    Cache,
    ProcessorPackage,
    Group,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    Unified,
    Instruction,
    Data,
    Trace,
}

/// One cache instance as reported for the processors it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheDescriptor {
    pub level: u8,
    /// Ways of associativity; `0xFF` is fully associative, `0` unknown.
    pub associativity: u8,
    pub line_size: u16,
    /// Capacity in bytes.
    pub size: u32,
    pub cache_type: CacheType,
}

/// Relationship-specific payload of a topology record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorInfo {
    /// Bit 0 of `flags` is set when the core runs more than one hardware thread.
    ProcessorCore { flags: u8 },
    NumaNode { node_number: u32 },
    Cache(CacheDescriptor),
    ProcessorPackage,
    Group,
    All,
}

impl ProcessorInfo {
    pub fn relationship(&self) -> Relationship {
        match self {
            ProcessorInfo::ProcessorCore { .. } => Relationship::ProcessorCore,
            ProcessorInfo::NumaNode { .. } => Relationship::NumaNode,
            ProcessorInfo::Cache(_) => Relationship::Cache,
            ProcessorInfo::ProcessorPackage => Relationship::ProcessorPackage,
            ProcessorInfo::Group => Relationship::Group,
            ProcessorInfo::All => Relationship::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorTopologyRecord {
    /// Logical processors covered by this record, one bit per processor.
    pub processor_mask: u64,
    pub info: ProcessorInfo,
}

impl ProcessorTopologyRecord {
    pub fn new(processor_mask: u64, info: ProcessorInfo) -> Self {
        ProcessorTopologyRecord { processor_mask, info }
    }

    pub fn cache(processor_mask: u64, descriptor: CacheDescriptor) -> Self {
        ProcessorTopologyRecord::new(processor_mask, ProcessorInfo::Cache(descriptor))
    }

    pub fn relationship(&self) -> Relationship {
        self.info.relationship()
    }

    /// Returns the cache payload, if this record describes a cache.
    pub fn cache_descriptor(&self) -> Option<&CacheDescriptor> {
        match &self.info {
            ProcessorInfo::Cache(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Source of raw processor topology for the host.
pub trait TopologyProvider {
    fn query_topology(&self) -> Result<Vec<ProcessorTopologyRecord>, PlatformQueryError>;
}

/// Topology provider for the current platform.
#[derive(Debug, Clone, Default)]
pub struct HostTopology {
    #[cfg(target_os = "linux")]
    inner: SysfsTopology,
    #[cfg(not(target_os = "linux"))]
    inner: CpuidTopology,
}

impl HostTopology {
    pub fn new() -> Self {
        HostTopology::default()
    }

    /// Reads Linux topology from `root` instead of `/sys/devices/system/cpu`.
    /// Ignored on other platforms.
    #[allow(unused_variables)]
    pub fn with_sysfs_root<P: Into<std::path::PathBuf>>(root: P) -> Self {
        HostTopology {
            #[cfg(target_os = "linux")]
            inner: SysfsTopology::with_root(root),
            #[cfg(not(target_os = "linux"))]
            inner: CpuidTopology::new(),
        }
    }
}

impl TopologyProvider for HostTopology {
    fn query_topology(&self) -> Result<Vec<ProcessorTopologyRecord>, PlatformQueryError> {
        self.inner.query_topology()
    }
}
