use crate::config::types::{Config, IdentityConfig, PipelineConfig, SourceConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_identity_config(&config.identity)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the listing source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url '{}': {}", config.seed_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url '{}' must use http or https",
            config.seed_url
        )));
    }

    validate_selector("record-selector", &config.record_selector)?;
    validate_selector("link-selector", &config.link_selector)?;
    validate_selector("pagination-selector", &config.pagination_selector)?;

    Ok(())
}

/// Validates worker pool and pacing parameters
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the proxy and user-agent pools
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    for proxy in &config.proxies {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    for agent in &config.user_agents {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agents entries cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output file paths
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache-path cannot be empty".to_string(),
        ));
    }

    if config.table_path.is_empty() {
        return Err(ConfigError::Validation(
            "table-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{OutputConfig, RotationKey};

    fn sample_config() -> Config {
        Config {
            source: SourceConfig {
                seed_url: "https://example.com/collections/widgets".to_string(),
                record_selector: "h1.h3.lh-condensed".to_string(),
                link_selector: "a[href]".to_string(),
                pagination_selector: "a[class*='paginate']".to_string(),
            },
            pipeline: PipelineConfig {
                max_workers: 6,
                min_delay_ms: 1000,
                max_delay_ms: 3000,
                fetch_timeout_secs: 30,
                extract_wait_secs: 15,
                rotation: RotationKey::SeenCount,
            },
            identity: IdentityConfig {
                proxies: vec![],
                user_agents: vec!["Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()],
            },
            output: OutputConfig {
                cache_path: "./scrape_cache.json".to_string(),
                table_path: "./projects.csv".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&sample_config()).is_ok());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut config = sample_config();
        config.pipeline.max_workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_delay_bounds() {
        let mut config = sample_config();
        config.pipeline.min_delay_ms = 5000;
        config.pipeline.max_delay_ms = 1000;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_seed_url() {
        let mut config = sample_config();
        config.source.seed_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_non_http_seed() {
        let mut config = sample_config();
        config.source.seed_url = "ftp://example.com/listing".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_bad_selector() {
        let mut config = sample_config();
        config.source.record_selector = ":::".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_rejects_bad_proxy_url() {
        let mut config = sample_config();
        config.identity.proxies = vec!["::nope::".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_blank_user_agent() {
        let mut config = sample_config();
        config.identity.user_agents = vec!["   ".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_pools_are_allowed() {
        let mut config = sample_config();
        config.identity.proxies = vec![];
        config.identity.user_agents = vec![];
        assert!(validate(&config).is_ok());
    }
}
