use crate::config::types::{ApiConfig, ApiKey, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Loads the configuration file if a path is given, otherwise the defaults
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Resolves the API key from the process environment
///
/// A `.env` file in the working directory is loaded first, if present.
/// Variables already set in the environment take precedence over it.
pub fn resolve_api_key(api: &ApiConfig) -> Result<ApiKey, ConfigError> {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    resolve_api_key_from(api, |name| std::env::var(name).ok())
}

/// Resolves the API key through an arbitrary variable lookup
///
/// Empty and whitespace-only values are treated as absent.
pub fn resolve_api_key_from<F>(api: &ApiConfig, lookup: F) -> Result<ApiKey, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&api.api_key_env)
        .and_then(ApiKey::new)
        .ok_or_else(|| ConfigError::MissingCredential {
            var: api.api_key_env.clone(),
        })
}
