// src/config/mod.rs

pub mod sizing_config;

pub use sizing_config::SizingConfig;
