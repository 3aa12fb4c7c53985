//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require the BaaS url and key before the service accepts traffic
//! - Validate value ranges (thresholds, windows, timeouts > 0)
//! - Check CORS origins parse as header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("baas.url is not a valid http(s) URL: {0}")]
    InvalidUrl(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.baas.url.trim().is_empty() {
        errors.push(ValidationError::Missing("baas.url"));
    } else {
        match Url::parse(&config.baas.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::InvalidUrl(config.baas.url.clone())),
        }
    }

    if config.baas.api_key.trim().is_empty() {
        errors.push(ValidationError::Missing("baas.api_key"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::Zero("rate_limit.max_requests"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::Zero("rate_limit.window_secs"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    if config.subscription.trial_days == 0 {
        errors.push(ValidationError::Zero("subscription.trial_days"));
    }

    for origin in &config.security.cors_origins {
        if HeaderValue::from_str(origin).is_err() || Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.baas.url = "https://example.supabase.co".to_string();
        config.baas.api_key = "anon-key".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let errors = validate_config(&ServiceConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::Missing("baas.url")));
        assert!(errors.contains(&ValidationError::Missing("baas.api_key")));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = valid_config();
        config.baas.url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidUrl("ftp://example.com".into())]);
    }

    #[test]
    fn test_zero_values() {
        let mut config = valid_config();
        config.rate_limit.max_requests = 0;
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);

        // Disabled limiter ignores its own values.
        config.rate_limit.enabled = false;
        config.timeouts.upstream_secs = 10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_origin() {
        let mut config = valid_config();
        config.security.cors_origins.push("not an origin".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidOrigin("not an origin".into())]);
    }
}
