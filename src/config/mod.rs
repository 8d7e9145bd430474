//! Configuration module for Crawl-Pilot
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and resolving the API credential from the environment.
//!
//! # Example
//!
//! ```no_run
//! use crawl_pilot::config::{load_config, resolve_api_key};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl-pilot.toml")).unwrap();
//! let key = resolve_api_key(&config.api).unwrap();
//! println!("Polling every {}s", config.poll.interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, ApiKey, Config, PollConfig, ScrapeConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, resolve_api_key, resolve_api_key_from};
