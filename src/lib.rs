// src/lib.rs

pub mod config;
pub mod error;
pub mod extractor;
pub mod gen0;
pub mod memory;
pub mod pipeline;
pub mod topology;

pub use error::{InvariantViolation, PlatformQueryError, SizingError};
pub use extractor::{extract_max_cache_size, CacheSizes};
pub use gen0::{compute_gen0_min_size, Gen0Size, InvariantChecks, SizingInputs};
pub use pipeline::{Gen0Pipeline, Gen0SizeResult};
