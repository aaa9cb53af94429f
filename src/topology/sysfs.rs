// src/topology/sysfs.rs
//
// Linux topology provider backed by /sys/devices/system/cpu.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::PlatformQueryError;
use crate::topology::{
    CacheDescriptor, CacheType, ProcessorInfo, ProcessorTopologyRecord, TopologyProvider,
};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system/cpu";

#[derive(Debug, Clone)]
pub struct SysfsTopology {
    root: PathBuf,
}

impl Default for SysfsTopology {
    fn default() -> Self {
        SysfsTopology::with_root(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsTopology {
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        SysfsTopology { root: root.into() }
    }

    /// Lists `cpuN` directories under the root, sorted by N.
    fn cpu_ids(&self) -> Result<Vec<usize>, PlatformQueryError> {
        let entries = fs::read_dir(&self.root).map_err(|source| PlatformQueryError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PlatformQueryError::Io {
                path: self.root.clone(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_prefix("cpu").and_then(|n| n.parse::<usize>().ok()) {
                if entry.path().is_dir() {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn cache_records(
        &self,
        cpu: usize,
        seen: &mut HashSet<(u8, CacheType, String)>,
        records: &mut Vec<ProcessorTopologyRecord>,
    ) -> Result<(), PlatformQueryError> {
        let cache_dir = self.root.join(format!("cpu{}", cpu)).join("cache");
        let entries = match fs::read_dir(&cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("cpu{} reports no cache directory", cpu);
                return Ok(());
            }
            Err(source) => return Err(PlatformQueryError::Io { path: cache_dir, source }),
        };

        let mut index_dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PlatformQueryError::Io {
                path: cache_dir.clone(),
                source,
            })?;
            if entry.file_name().to_string_lossy().starts_with("index") {
                index_dirs.push(entry.path());
            }
        }
        index_dirs.sort();

        for dir in index_dirs {
            let Some(level) = read_attr(&dir.join("level"))? else { continue };
            let level = parse_number::<u8>(&dir.join("level"), &level)?;

            let Some(kind) = read_attr(&dir.join("type"))? else { continue };
            let cache_type = parse_cache_type(&kind).ok_or_else(|| {
                PlatformQueryError::Topology(format!(
                    "unrecognized cache type '{}' in {}",
                    kind,
                    dir.display()
                ))
            })?;

            let Some(size) = read_attr(&dir.join("size"))? else { continue };
            let size = parse_size_token(&size).ok_or_else(|| {
                PlatformQueryError::Topology(format!(
                    "invalid cache size '{}' in {}",
                    size,
                    dir.display()
                ))
            })?;

            let line_size = match read_attr(&dir.join("coherency_line_size"))? {
                Some(v) => parse_number::<u16>(&dir.join("coherency_line_size"), &v)?,
                None => 0,
            };
            let associativity = match read_attr(&dir.join("ways_of_associativity"))? {
                // Ways beyond 0xFF do not fit the descriptor; clamp to the fully associative marker.
                Some(v) => parse_number::<u32>(&dir.join("ways_of_associativity"), &v)?
                    .min(0xFF) as u8,
                None => 0,
            };

            let shared = read_attr(&dir.join("shared_cpu_map"))?;
            let processor_mask = match &shared {
                Some(map) => parse_cpu_map(map).ok_or_else(|| {
                    PlatformQueryError::Topology(format!(
                        "invalid shared_cpu_map '{}' in {}",
                        map,
                        dir.display()
                    ))
                })?,
                None => cpu_bit(cpu),
            };

            // Every cpu sharing a cache reports it; keep one record per instance.
            let key = (level, cache_type, shared.unwrap_or_else(|| format!("cpu{}", cpu)));
            if !seen.insert(key) {
                continue;
            }

            records.push(ProcessorTopologyRecord::cache(
                processor_mask,
                CacheDescriptor {
                    level,
                    associativity,
                    line_size,
                    size,
                    cache_type,
                },
            ));
        }

        Ok(())
    }
}

impl TopologyProvider for SysfsTopology {
    fn query_topology(&self) -> Result<Vec<ProcessorTopologyRecord>, PlatformQueryError> {
        let cpus = self.cpu_ids()?;
        if cpus.is_empty() {
            return Err(PlatformQueryError::Topology(format!(
                "no cpu entries found under {}",
                self.root.display()
            )));
        }

        let mut records = Vec::new();
        let mut cores: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
        let mut packages: BTreeMap<u32, u64> = BTreeMap::new();
        let mut seen_caches = HashSet::new();

        for &cpu in &cpus {
            let topo = self.root.join(format!("cpu{}", cpu)).join("topology");
            let package = read_attr(&topo.join("physical_package_id"))?;
            let core = read_attr(&topo.join("core_id"))?;
            if let (Some(package), Some(core)) = (package, core) {
                let package = parse_number::<u32>(&topo.join("physical_package_id"), &package)?;
                let core = parse_number::<u32>(&topo.join("core_id"), &core)?;
                cores.entry((package, core)).or_default().push(cpu);
                *packages.entry(package).or_default() |= cpu_bit(cpu);
            }

            self.cache_records(cpu, &mut seen_caches, &mut records)?;
        }

        for threads in cores.values() {
            let mask = threads.iter().fold(0u64, |acc, &cpu| acc | cpu_bit(cpu));
            let flags = if threads.len() > 1 { 1 } else { 0 };
            records.push(ProcessorTopologyRecord::new(mask, ProcessorInfo::ProcessorCore { flags }));
        }
        for &mask in packages.values() {
            records.push(ProcessorTopologyRecord::new(mask, ProcessorInfo::ProcessorPackage));
        }

        debug!(
            "sysfs topology at {}: {} cpus, {} cores, {} packages, {} records",
            self.root.display(),
            cpus.len(),
            cores.len(),
            packages.len(),
            records.len()
        );
        Ok(records)
    }
}

/// Reads a sysfs attribute, treating a missing file as absent.
fn read_attr(path: &Path) -> Result<Option<String>, PlatformQueryError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PlatformQueryError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_number<T: std::str::FromStr>(path: &Path, value: &str) -> Result<T, PlatformQueryError> {
    value.trim().parse::<T>().map_err(|_| {
        PlatformQueryError::Topology(format!("invalid value '{}' in {}", value, path.display()))
    })
}

fn parse_cache_type(s: &str) -> Option<CacheType> {
    match s.trim() {
        "Data" => Some(CacheType::Data),
        "Instruction" => Some(CacheType::Instruction),
        "Unified" => Some(CacheType::Unified),
        "Trace" => Some(CacheType::Trace),
        _ => None,
    }
}

/// Parses sysfs size tokens such as "32K", "2M" or "1048576".
pub(crate) fn parse_size_token(s: &str) -> Option<u32> {
    let t = s.trim();
    let digits = t.chars().take_while(|c| c.is_ascii_digit()).count();
    let (num, suffix) = t.split_at(digits);
    let n: u64 = num.parse().ok()?;
    let mult: u64 = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        _ => return None,
    };
    u32::try_from(n.checked_mul(mult)?).ok()
}

/// Parses a comma-grouped hex cpu map ("00000000,0000000f") into its low 64 bits.
pub(crate) fn parse_cpu_map(s: &str) -> Option<u64> {
    let hex: String = s.trim().chars().filter(|&c| c != ',').collect();
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let low = if hex.len() > 16 { &hex[hex.len() - 16..] } else { &hex[..] };
    u64::from_str_radix(low, 16).ok()
}

fn cpu_bit(cpu: usize) -> u64 {
    if cpu < 64 {
        1u64 << cpu
    } else {
        0
    }
}
