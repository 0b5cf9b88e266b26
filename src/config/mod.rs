//! Configuration module for idscrape
//!
//! A run is described by one immutable [`Config`]. It starts from the
//! defaults, optionally overlays a TOML file, then takes command-line
//! overrides, and is validated once before the pipeline starts.
//!
//! # Example
//!
//! ```no_run
//! use idscrape::config::{load_config, validate};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrape.toml")).unwrap();
//! validate(&config).unwrap();
//! println!("Scraping ids {}..{}", config.scrape.from, config.scrape.to);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FieldQuery, FieldsConfig, HttpConfig, OutputConfig, ScrapeConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
