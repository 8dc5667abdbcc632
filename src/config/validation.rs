use crate::config::types::{
    ApiConfig, Config, CrawlConfig, OutputConfig, RepairConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent_config(&config.user_agent)?;
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;
    validate_crawl_config(&config.crawl)?;
    validate_repair_config(&config.repair)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.bot_name.is_empty() {
        return Err(ConfigError::Validation(
            "bot_name cannot be empty".to_string(),
        ));
    }

    if !config
        .bot_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "bot_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.bot_name
        )));
    }

    if config.contact.trim().is_empty() {
        return Err(ConfigError::Validation(
            "contact cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the endpoint template and request limits
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if !config.endpoint.contains("{site}") {
        return Err(ConfigError::Validation(format!(
            "api endpoint must contain a {{site}} placeholder, got '{}'",
            config.endpoint
        )));
    }

    // The placeholder itself is not a valid host label, so probe with a real one
    let probe = config.endpoint.replace("{site}", "pl.wikipedia.org");
    let url = Url::parse(&probe)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api endpoint: {}", e)))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "api endpoint must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.page_limit < 1 || config.page_limit > 500 {
        return Err(ConfigError::Validation(format!(
            "page_limit must be between 1 and 500, got {}",
            config.page_limit
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.content_dir.is_empty() {
        return Err(ConfigError::Validation(
            "content_dir cannot be empty".to_string(),
        ));
    }

    if config.repair_script.is_empty() {
        return Err(ConfigError::Validation(
            "repair_script cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl tuning values
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_site(&config.default_site)?;

    if config.subpage_step < 0 || config.discovered_step < 0 {
        return Err(ConfigError::Validation(format!(
            "level steps must be >= 0, got subpage {} / discovered {}",
            config.subpage_step, config.discovered_step
        )));
    }

    if !config.throttle_factor.is_finite() || config.throttle_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "throttle_factor must be a non-negative number, got {}",
            config.throttle_factor
        )));
    }

    if !config.min_fetch_secs.is_finite() || config.min_fetch_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min_fetch_secs must be a non-negative number, got {}",
            config.min_fetch_secs
        )));
    }

    for lang in &config.link_languages {
        if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_lowercase() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "Invalid link language code: '{}'",
                lang
            )));
        }
    }

    Ok(())
}

/// Validates repair targets
fn validate_repair_config(config: &RepairConfig) -> Result<(), ConfigError> {
    for target in &config.targets {
        validate_site(&target.site)?;
        if target.lang.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Repair target '{}' needs a language",
                target.site
            )));
        }
    }
    Ok(())
}

/// Validates a wiki host such as `pl.wikipedia.org`
fn validate_site(site: &str) -> Result<(), ConfigError> {
    if site.split('.').count() < 3 {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must look like '<lang>.<project>.org'",
            site
        )));
    }

    if site.split('.').any(|label| label.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "Site '{}' contains an empty label",
            site
        )));
    }

    if !site
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Site '{}' contains invalid characters",
            site
        )));
    }

    Ok(())
}
