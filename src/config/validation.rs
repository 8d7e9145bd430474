use crate::config::types::{ApiConfig, Config, PollConfig, ScrapeConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_poll_config(&config.poll)?;
    validate_scrape_config(&config.scrape)?;
    Ok(())
}

/// Validates remote service settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the polling cadence
fn validate_poll_config(config: &PollConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval-secs must be >= 1, got {}",
            config.interval_secs
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates scrape options
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "formats must list at least one output format".to_string(),
        ));
    }

    if let Some(blank) = config
        .formats
        .iter()
        .chain(config.parsers.iter())
        .find(|entry| entry.trim().is_empty())
    {
        return Err(ConfigError::Validation(format!(
            "format and parser names cannot be blank, got '{}'",
            blank
        )));
    }

    Ok(())
}
