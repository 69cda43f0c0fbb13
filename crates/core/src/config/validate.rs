use super::{types::Config, ConfigError};
use crate::harvest::{offsets_fit, MAX_CONCURRENCY};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Source paging values and timeout are non-zero
/// - Page offsets stay within range
/// - Worker pool widths are within 1..=MAX_CONCURRENCY
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.source.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.base_url cannot be empty".to_string(),
        ));
    }

    if config.source.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "source.page_size cannot be 0".to_string(),
        ));
    }

    if config.source.max_total_pages == 0 {
        return Err(ConfigError::ValidationError(
            "source.max_total_pages cannot be 0".to_string(),
        ));
    }

    if !offsets_fit(config.source.page_size, config.source.max_total_pages) {
        return Err(ConfigError::ValidationError(
            "source.page_size * source.max_total_pages overflows the page offset".to_string(),
        ));
    }

    if config.source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "source.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.harvest.fetch_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "harvest.fetch_concurrency cannot be 0".to_string(),
        ));
    }

    if config.harvest.fetch_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::ValidationError(format!(
            "harvest.fetch_concurrency cannot exceed {}",
            MAX_CONCURRENCY
        )));
    }

    match config.harvest.transform_concurrency {
        Some(0) => {
            return Err(ConfigError::ValidationError(
                "harvest.transform_concurrency cannot be 0".to_string(),
            ))
        }
        Some(width) if width > MAX_CONCURRENCY => {
            return Err(ConfigError::ValidationError(format!(
                "harvest.transform_concurrency cannot exceed {}",
                MAX_CONCURRENCY
            )))
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_page_size_zero_fails() {
        let mut config = Config::default();
        config.source.page_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let mut config = Config::default();
        config.source.base_url = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_widths_fail() {
        let mut config = Config::default();
        config.harvest.fetch_concurrency = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.harvest.transform_concurrency = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_oversized_widths_fail() {
        let mut config = Config::default();
        config.harvest.fetch_concurrency = MAX_CONCURRENCY + 1;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("fetch_concurrency"));

        let mut config = Config::default();
        config.harvest.transform_concurrency = Some(usize::MAX);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("transform_concurrency"));
    }

    #[test]
    fn test_validate_overflowing_page_offset_fails() {
        let mut config = Config::default();
        config.source.page_size = u32::MAX;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("page offset"));
    }

    #[test]
    fn test_validate_zero_target_count_is_allowed() {
        let mut config = Config::default();
        config.harvest.target_count = 0;
        assert!(validate_config(&config).is_ok());
    }
}
