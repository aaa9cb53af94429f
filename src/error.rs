// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// A platform provider could not report topology or memory data.
#[derive(Debug, Error)]
pub enum PlatformQueryError {
    /// Processor topology could not be determined
    #[error("Unable to query processor topology: {0}")]
    Topology(String),

    /// Installed memory could not be determined
    #[error("Unable to return memory stats: {0}")]
    Memory(String),

    /// A host file backing the query could not be read
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Internal precondition of the sizing heuristic did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("expected a positive scaled cache size, got {scaled_cache_size}")]
    NonPositiveCacheSize { scaled_cache_size: u64 },
}

/// Top-level error for one gen0 sizing run.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error(transparent)]
    Platform(#[from] PlatformQueryError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_messages() {
        let err = PlatformQueryError::Memory("zero bytes reported".to_string());
        assert_eq!(err.to_string(), "Unable to return memory stats: zero bytes reported");

        let err = PlatformQueryError::Io {
            path: PathBuf::from("/sys/devices/system/cpu"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("Failed to read '/sys/devices/system/cpu'"));
    }

    #[test]
    fn test_sizing_error_wraps_sources() {
        let err: SizingError = InvariantViolation::NonPositiveCacheSize { scaled_cache_size: 0 }.into();
        assert_eq!(
            err.to_string(),
            "Invariant violation: expected a positive scaled cache size, got 0"
        );

        let err: SizingError = PlatformQueryError::Topology("no cpus".to_string()).into();
        assert_eq!(err.to_string(), "Unable to query processor topology: no cpus");
    }
}
