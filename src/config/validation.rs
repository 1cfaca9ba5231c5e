use crate::config::types::{Config, CrawlerConfig, IndexConfig, LoaderConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_CONCURRENCY: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_loader_config(&config.loader)?;
    validate_index_config(&config.index)?;
    Ok(())
}

/// Validates the start URLs
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max_depth must be >= 1 (seeds are depth 1)".to_string(),
        ));
    }

    if config.max_pages_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_domain must be >= 1, got {}",
            config.max_pages_per_domain
        )));
    }

    Ok(())
}

/// Validates loader timeouts
fn validate_loader_config(config: &LoaderConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.navigation_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "navigation_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.body_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "body_timeout_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates index naming and storage paths
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_base_name(&config.base)?;

    if let Some(version) = &config.crawl_version {
        validate_crawl_version(version)?;
    }

    Ok(())
}

/// Validates the collection base name
///
/// Collection names are derived from it, so it is restricted to lowercase
/// ascii letters, digits, `_` and `-`.
pub(crate) fn validate_base_name(base: &str) -> Result<(), ConfigError> {
    if base.is_empty() {
        return Err(ConfigError::Validation("base cannot be empty".to_string()));
    }

    if !base
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "base '{}' may only contain lowercase letters, digits, '_' and '-'",
            base
        )));
    }

    Ok(())
}

/// Validates a crawl version label
pub(crate) fn validate_crawl_version(version: &str) -> Result<(), ConfigError> {
    if version.is_empty() {
        return Err(ConfigError::Validation(
            "crawl_version cannot be empty".to_string(),
        ));
    }

    if version.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ConfigError::Validation(format!(
            "crawl_version '{}' cannot contain whitespace or '/'",
            version
        )));
    }

    Ok(())
}
