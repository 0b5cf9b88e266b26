use crate::config::types::Config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads a configuration file from the given path
///
/// Every section is optional; missing keys fall back to their defaults.
/// Validation is left to the caller because command-line overrides are
/// usually applied on top of the file before the result is checked.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use idscrape::config::load_config;
///
/// let config = load_config(Path::new("scrape.toml")).unwrap();
/// println!("Template: {}", config.scrape.url_template);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Computes a SHA-256 fingerprint of a configuration file
///
/// Logged at startup so runs can be matched to the file that drove them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(fingerprint(&content))
}

/// Loads a configuration together with the fingerprint of the same bytes
///
/// The file is read once, so the hash always describes the content that
/// was parsed even if the file changes on disk meanwhile.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let hash = fingerprint(content.as_bytes());
    let config = toml::from_str(&content)?;
    Ok((config, hash))
}

fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
