// src/config/sizing_config.rs

use serde::{Deserialize, Serialize};
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use std::path::Path;

use crate::gen0::InvariantChecks;
use crate::topology::sysfs::DEFAULT_SYSFS_ROOT;

/// Runtime configuration for the gen0 sizing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Fail on internal invariant violations; unset follows the build profile
    pub invariant_checks: Option<bool>,

    /// Logical processor count override; unset uses every logical processor
    pub processor_count: Option<usize>,

    /// Directory holding the Linux cpu topology
    pub sysfs_root: String,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            log_level: "info".to_string(),
            invariant_checks: None,
            processor_count: None,
            sysfs_root: DEFAULT_SYSFS_ROOT.to_string(),
        }
    }
}

impl SizingConfig {
    /// Load configuration with precedence: config file → env vars → defaults
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if Path::new("gen0size.toml").exists() {
            builder = builder.add_source(File::with_name("gen0size.toml"));
        }

        Self::finish(builder)
    }

    /// Load configuration with custom file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        Self::finish(builder)
    }

    pub fn invariant_checks(&self) -> InvariantChecks {
        self.invariant_checks
            .map(InvariantChecks::from_flag)
            .unwrap_or_default()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("log_level", "info")?
            .set_default("sysfs_root", DEFAULT_SYSFS_ROOT)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        // Override with environment variables (prefix: GEN0SIZE_)
        let config = builder
            .add_source(
                Environment::with_prefix("GEN0SIZE")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SizingConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.invariant_checks, None);
        assert_eq!(config.processor_count, None);
        assert_eq!(config.sysfs_root, "/sys/devices/system/cpu");
        assert_eq!(config.invariant_checks(), InvariantChecks::default());
    }

    #[test]
    fn test_load_without_file() {
        let config = SizingConfig::load_from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.sysfs_root, DEFAULT_SYSFS_ROOT);
        assert!(config.processor_count.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        writeln!(file, "invariant_checks = false").unwrap();
        writeln!(file, "processor_count = 64").unwrap();
        writeln!(file, "sysfs_root = \"/tmp/fake-cpu\"").unwrap();
        file.flush().unwrap();

        let config = SizingConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.invariant_checks(), InvariantChecks::Ignore);
        assert_eq!(config.processor_count, Some(64));
        assert_eq!(config.sysfs_root, "/tmp/fake-cpu");
    }
}
