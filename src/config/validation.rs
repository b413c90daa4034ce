//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work (unparseable addresses, unsupported upstream schemes, zero timeouts).
//! Every problem is reported, not just the first.

use std::net::SocketAddr;

use axum::http::Uri;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `upstream.url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match config.upstream.url.parse::<Uri>() {
        Ok(uri) => {
            match uri.scheme_str() {
                Some("http") => {}
                Some(other) => errors.push(ValidationError::new(
                    "upstream.url",
                    format!("unsupported scheme '{}', only http is supported", other),
                )),
                None => errors.push(ValidationError::new("upstream.url", "missing scheme")),
            }
            if uri.host().is_none() {
                errors.push(ValidationError::new("upstream.url", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "upstream.url",
            format!("'{}' is not a valid URL: {}", config.upstream.url, e),
        )),
    }

    if !config.rewrite.special_path.starts_with('/') {
        errors.push(ValidationError::new(
            "rewrite.special_path",
            "must start with '/'",
        ));
    }
    if config.rewrite.max_body_bytes == 0 {
        errors.push(ValidationError::new("rewrite.max_body_bytes", "must be > 0"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
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

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.url = "https://api.example.com".into();
        config.rewrite.special_path = "6/t4/dev_device_info".into();
        config.timeouts.upstream_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "upstream.url",
                "rewrite.special_path",
                "timeouts.upstream_secs",
            ]
        );
    }

    #[test]
    fn upstream_needs_scheme_and_host() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "/just/a/path".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message == "missing scheme"));
        assert!(errors.iter().any(|e| e.message == "missing host"));
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
    }
}
