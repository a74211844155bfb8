//! Configuration module for Crash-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use crash_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Detail pages come from {}", config.source.detail_url);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{CacheConfig, ClientConfig, Config, CrawlerConfig, OutputConfig, SourceConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
