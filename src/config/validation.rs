use crate::config::types::{Config, FieldsConfig, HttpConfig, OutputConfig, ScrapeConfig};
use crate::pipeline::{QuerySet, UrlTemplate};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Columns that always lead every row
const RESERVED_COLUMNS: [&str; 2] = ["url", "id"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scrape_config(&config.scrape)?;
    validate_fields(&config.fields)?;
    validate_output_config(&config.output)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates the template, range and worker count
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    let template = UrlTemplate::parse(&config.url_template)?;

    // Any id renders the same shape, so one sample is enough
    let sample = template.render(config.from);
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", sample, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use the http or https scheme",
            sample
        )));
    }

    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.to <= config.from {
        tracing::warn!(
            "Id range [{}, {}) is empty, output will contain the header only",
            config.from,
            config.to
        );
    }

    Ok(())
}

/// Validates column names and selectors
fn validate_fields(fields: &FieldsConfig) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = RESERVED_COLUMNS.into_iter().collect();

    for field in fields.ordered() {
        if field.column.trim().is_empty() {
            return Err(ConfigError::Validation(
                "column names cannot be empty".to_string(),
            ));
        }

        if !seen.insert(field.column.as_str()) {
            return Err(ConfigError::Validation(format!(
                "column name '{}' is used more than once",
                field.column
            )));
        }
    }

    // Compiling the set checks every selector, including empty ones
    QuerySet::compile(fields.selectors())?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
